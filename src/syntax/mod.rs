//! Grammar-driven syntax highlighting
//!
//! This module provides the TextMate-style pipeline:
//! - Grammar loading and include resolution
//! - Match scanning and recursive tokenization into scope spans
//! - Flattening spans into runs, and styling runs with a theme

mod builtin;
mod grammar;
mod highlighter;
mod raw;
mod registry;
mod resolve;
mod scanner;
mod style;
mod theme;
mod tokenizer;

pub use grammar::{CaptureMap, Grammar, Include, Region, Rule, RuleId, RuleKind};
pub use highlighter::{flatten, merge_runs, Highlighter, Run};
pub use raw::{RawCapture, RawCaptures, RawGrammar, RawRule};
pub use registry::GrammarRegistry;
pub use resolve::ActiveSet;
pub use scanner::{scan, MatchCandidate, MatchStream, Phase};
pub use style::{Color, Style};
pub use theme::Theme;
pub use tokenizer::{ScopeSpan, Tokenizer};
