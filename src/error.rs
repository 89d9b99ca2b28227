//! Error types for scope-highlight

use thiserror::Error;

/// Result type alias for grammar and highlighting operations
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Errors raised while building grammars or loading configuration.
///
/// Tokenizing and flattening never fail; every variant here is detected
/// before any text is scanned.
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("unresolved include `{0}`")]
    UnresolvedInclude(String),

    #[error("malformed rule at {rule}: {reason}")]
    MalformedRule { rule: String, reason: &'static str },

    #[error("rule at {rule} mixes `captures` with `beginCaptures`/`endCaptures`")]
    ConflictingCaptures { rule: String },

    #[error("invalid capture index `{index}` at {rule}")]
    InvalidCaptureIndex { rule: String, index: String },

    #[error("invalid regex at {rule}: {source}")]
    Regex {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("grammar JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no grammar registered for scope `{0}`")]
    UnknownGrammar(String),
}
