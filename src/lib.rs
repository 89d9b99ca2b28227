//! scope-highlight - TextMate-style grammar tokenizer and highlighter
//!
//! A grammar is loaded from its JSON (or TOML) form, its includes are
//! resolved once, and any number of documents can then be tokenized into
//! nested scope spans or flattened into runs for rendering.
//!
//! ```no_run
//! use scope_highlight::GrammarRegistry;
//!
//! # fn main() -> scope_highlight::Result<()> {
//! let registry = GrammarRegistry::with_builtins()?;
//! for run in registry.highlight("source.json", r#"{"a": 1}"#)? {
//!     println!("{:?} {:?}", run.scopes, run.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod syntax;

pub use config::Config;
pub use error::{HighlightError, Result};
pub use syntax::{Grammar, GrammarRegistry, Highlighter, Run, ScopeSpan, Theme, Tokenizer};
