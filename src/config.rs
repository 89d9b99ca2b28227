//! Configuration file support
//!
//! Format: TOML with kebab-case keys
//!
//! Example:
//! ```text
//! # scope-highlight configuration
//! merge-adjacent-runs = true
//!
//! [file-types]
//! jsonl = "source.json"
//! Pipfile = "source.ini"
//!
//! [theme]
//! "string" = { fg = "yellow" }
//! "comment" = { fg = "bright-black", italic = true }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::syntax::Style;

/// Configuration settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Coalesce adjacent runs that carry the same scope stack
    pub merge_adjacent_runs: bool,
    /// Extension or file name -> grammar scope name
    pub file_types: BTreeMap<String, String>,
    /// Scope selector -> style overrides
    pub theme: BTreeMap<String, Style>,
}

impl Config {
    /// Parse configuration text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        tracing::debug!(
            path = %path.display(),
            file_types = config.file_types.len(),
            theme_rules = config.theme.len(),
            "loaded config"
        );
        Ok(config)
    }
}
