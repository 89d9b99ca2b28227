//! Serialized grammar shape
//!
//! These types mirror the TextMate grammar layout field for field so that
//! grammars written as JSON or TOML deserialize without any projection.
//! They carry no validation; see [`Grammar::from_raw`](super::Grammar::from_raw).

use std::collections::BTreeMap;

use serde::Deserialize;

/// A capture entry (`{ "name": "punctuation.paren.open" }`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCapture {
    pub name: Option<String>,
}

/// Capture map keyed by the group index as written in the source (`"0"`, `"1"`, ...)
pub type RawCaptures = BTreeMap<String, RawCapture>;

/// One pattern entry of a grammar
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    pub name: Option<String>,
    #[serde(rename = "match")]
    pub match_: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub content_name: Option<String>,
    pub captures: Option<RawCaptures>,
    pub begin_captures: Option<RawCaptures>,
    pub end_captures: Option<RawCaptures>,
    pub include: Option<String>,
    pub patterns: Option<Vec<RawRule>>,
}

/// A complete grammar document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    pub scope_name: String,
    pub name: Option<String>,
    #[serde(default)]
    pub file_types: Vec<String>,
    pub first_line_match: Option<String>,
    pub folding_start_marker: Option<String>,
    pub folding_stop_marker: Option<String>,
    pub patterns: Vec<RawRule>,
    #[serde(default)]
    pub repository: BTreeMap<String, RawRule>,
}
