//! Grammar registry
//!
//! This module provides the GrammarRegistry that coordinates grammar
//! lookup, language detection and highlighting.

use std::collections::HashMap;
use std::path::Path;

use super::builtin;
use super::grammar::Grammar;
use super::highlighter::{Highlighter, Run};
use crate::config::Config;
use crate::error::{HighlightError, Result};

/// Owns grammars keyed by scope name
#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    /// Loaded grammars
    grammars: HashMap<String, Grammar>,
    /// File type (extension or file name) to scope name
    file_type_map: HashMap<String, String>,
    /// Whether highlighting merges adjacent runs
    merge_adjacent: bool,
}

impl GrammarRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in grammars
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for grammar in builtin::all_grammars()? {
            registry.add_grammar(grammar);
        }
        Ok(registry)
    }

    /// Add a grammar, replacing any grammar with the same scope name
    pub fn add_grammar(&mut self, grammar: Grammar) {
        let scope = grammar.scope_name().to_string();
        for file_type in grammar.file_types() {
            self.file_type_map.insert(normalize(file_type), scope.clone());
        }
        tracing::debug!(scope = %scope, file_types = grammar.file_types().len(), "registered grammar");
        self.grammars.insert(scope, grammar);
    }

    /// Apply file type overrides and output options from a config
    pub fn apply_config(&mut self, config: &Config) {
        for (file_type, scope) in &config.file_types {
            self.file_type_map.insert(normalize(file_type), scope.clone());
        }
        self.merge_adjacent = config.merge_adjacent_runs;
    }

    /// Detect a grammar scope from a path: full file name first, then extension
    pub fn detect_language(&self, path: &Path) -> Option<&str> {
        let by_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| self.file_type_map.get(&normalize(name)));
        let scope = by_name.or_else(|| {
            let ext = path.extension()?.to_str()?;
            self.file_type_map.get(&normalize(ext))
        })?;

        // Overrides may name grammars that are not loaded
        self.grammars.contains_key(scope).then_some(scope.as_str())
    }

    /// Detect a grammar scope from the first line of a document
    pub fn detect_first_line(&self, text: &str) -> Option<&str> {
        let line = text.lines().next()?;
        self.list_grammars()
            .into_iter()
            .find(|scope| self.grammars[*scope].matches_first_line(line))
    }

    /// Get a grammar by scope name
    pub fn grammar(&self, scope: &str) -> Option<&Grammar> {
        self.grammars.get(scope)
    }

    /// Build a highlighter for a registered grammar
    pub fn highlighter(&self, scope: &str) -> Result<Highlighter<'_>> {
        let grammar = self
            .grammar(scope)
            .ok_or_else(|| HighlightError::UnknownGrammar(scope.to_string()))?;
        Ok(Highlighter::new(grammar).with_merge_adjacent(self.merge_adjacent))
    }

    /// Highlight a complete document with a registered grammar
    pub fn highlight<'t>(&self, scope: &str, text: &'t str) -> Result<Vec<Run<'t>>> {
        Ok(self.highlighter(scope)?.highlight(text))
    }

    /// List registered scope names
    pub fn list_grammars(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.grammars.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

fn normalize(file_type: &str) -> String {
    file_type.trim_start_matches('.').to_lowercase()
}
