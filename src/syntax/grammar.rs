//! Grammar model
//!
//! A [`Grammar`] stores its rules in an arena and refers to them through
//! [`RuleId`] handles, so recursive and cyclic rule graphs (`$self`, mutual
//! repository includes) need no shared ownership. A grammar is immutable
//! once built and can be shared freely between threads.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use super::raw::{RawCaptures, RawGrammar, RawRule};
use super::resolve::{self, ActiveSet, Resolution};
use crate::error::{HighlightError, Result};

/// Handle to a rule in a grammar's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    /// Position of the rule in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Capture group index -> scope tag
pub type CaptureMap = BTreeMap<usize, String>;

/// Target of an `include` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Include {
    /// `#name`: an entry of the grammar's repository
    Repository(String),
    /// `$self` or `$base`: the grammar's root pattern list
    Root,
}

/// A begin/end delimited region
#[derive(Debug, Clone)]
pub struct Region {
    pub begin: Regex,
    pub end: Regex,
    /// Scope applied strictly between the begin and end matches
    pub content_name: Option<String>,
    pub begin_captures: CaptureMap,
    pub end_captures: CaptureMap,
    /// Child rules active inside the region
    pub patterns: Vec<RuleId>,
}

/// The matching mode of a rule
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Single-shot `match` regex
    Match { regex: Regex, captures: CaptureMap },
    /// `begin`/`end` pair
    Region(Region),
    /// Pure container of child rules
    Container { patterns: Vec<RuleId> },
    /// Pure reference to other rules
    Include(Include),
}

/// One rule of a grammar
#[derive(Debug, Clone)]
pub struct Rule {
    /// Scope applied to the whole match or region
    pub name: Option<String>,
    pub kind: RuleKind,
}

impl Rule {
    /// Get the region definition if this rule is a begin/end pair
    pub fn region(&self) -> Option<&Region> {
        match &self.kind {
            RuleKind::Region(region) => Some(region),
            _ => None,
        }
    }
}

/// A compiled, validated grammar
#[derive(Debug, Clone)]
pub struct Grammar {
    scope_name: String,
    display_name: Option<String>,
    file_types: Vec<String>,
    first_line_match: Option<Regex>,
    folding_start_marker: Option<String>,
    folding_stop_marker: Option<String>,
    rules: Vec<Rule>,
    patterns: Vec<RuleId>,
    repository: BTreeMap<String, RuleId>,
    resolution: Resolution,
}

impl Grammar {
    /// Parse a grammar from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawGrammar = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Parse a grammar from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let raw: RawGrammar = toml::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Build a grammar from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawGrammar = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    /// Compile and validate a raw grammar.
    ///
    /// Every regex is compiled, every rule is checked for a single matching
    /// mode, and every include is resolved here, so a grammar that builds
    /// can tokenize any text without failing.
    #[tracing::instrument(level = "debug", skip_all, fields(scope = %raw.scope_name))]
    pub fn from_raw(raw: RawGrammar) -> Result<Self> {
        if raw.scope_name.trim().is_empty() {
            return Err(HighlightError::MissingField("scopeName"));
        }

        let first_line_match = raw
            .first_line_match
            .as_deref()
            .map(|pattern| compile(pattern, "firstLineMatch"))
            .transpose()?;

        let mut builder = ArenaBuilder::default();

        // Repository entries get their handles first so that the same
        // handle is shared by every `#name` include.
        let mut repository = BTreeMap::new();
        for (name, rule) in &raw.repository {
            let path = format!("repository.{}", name);
            let id = builder.add(rule, &path)?;
            repository.insert(name.clone(), id);
        }

        let patterns = builder.add_list(&raw.patterns, "patterns")?;

        let mut grammar = Self {
            scope_name: raw.scope_name,
            display_name: raw.name,
            file_types: raw.file_types,
            first_line_match,
            folding_start_marker: raw.folding_start_marker,
            folding_stop_marker: raw.folding_stop_marker,
            rules: builder.rules,
            patterns,
            repository,
            resolution: Resolution::default(),
        };
        grammar.resolution = resolve::resolve(&grammar)?;

        tracing::debug!(
            rules = grammar.rules.len(),
            scanned = grammar.resolution.scan_order().len(),
            "grammar built"
        );
        Ok(grammar)
    }

    /// Root scope tag (e.g. "source.json")
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// Human readable name, if the grammar declares one
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// File extensions or file names this grammar applies to
    pub fn file_types(&self) -> &[String] {
        &self.file_types
    }

    /// Check whether a first line of text selects this grammar
    pub fn matches_first_line(&self, line: &str) -> bool {
        self.first_line_match
            .as_ref()
            .map_or(false, |regex| regex.is_match(line))
    }

    /// Folding start marker (opaque to the tokenizer)
    pub fn folding_start_marker(&self) -> Option<&str> {
        self.folding_start_marker.as_deref()
    }

    /// Folding stop marker (opaque to the tokenizer)
    pub fn folding_stop_marker(&self) -> Option<&str> {
        self.folding_stop_marker.as_deref()
    }

    /// Get a rule by handle
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    /// Number of rules in the arena
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Root pattern list, before include resolution
    pub fn patterns(&self) -> &[RuleId] {
        &self.patterns
    }

    /// Look up a repository entry by name
    pub fn repository_rule(&self, name: &str) -> Option<RuleId> {
        self.repository.get(name).copied()
    }

    /// Active rule set at the top level
    pub fn root_set(&self) -> &ActiveSet {
        self.resolution.root()
    }

    /// Active rule set inside a region rule
    pub fn region_set(&self, id: RuleId) -> Option<&ActiveSet> {
        self.resolution.region(id)
    }

    /// Every rule whose regexes are scanned, in discovery order
    pub fn scan_order(&self) -> &[RuleId] {
        self.resolution.scan_order()
    }
}

/// Compile a pattern with line-anchored `^`/`$`
fn compile(pattern: &str, rule: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| HighlightError::Regex {
            rule: rule.to_string(),
            source,
        })
}

fn malformed(path: &str, reason: &'static str) -> HighlightError {
    HighlightError::MalformedRule {
        rule: path.to_string(),
        reason,
    }
}

/// Flattens nested raw rules into the arena
#[derive(Default)]
struct ArenaBuilder {
    rules: Vec<Rule>,
}

impl ArenaBuilder {
    fn add_list(&mut self, rules: &[RawRule], path: &str) -> Result<Vec<RuleId>> {
        rules
            .iter()
            .enumerate()
            .map(|(i, rule)| self.add(rule, &format!("{}[{}]", path, i)))
            .collect()
    }

    fn add(&mut self, raw: &RawRule, path: &str) -> Result<RuleId> {
        let kind = self.kind(raw, path)?;
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule {
            name: raw.name.clone(),
            kind,
        });
        Ok(id)
    }

    fn kind(&mut self, raw: &RawRule, path: &str) -> Result<RuleKind> {
        let has_phase_captures = raw.begin_captures.is_some() || raw.end_captures.is_some();
        if raw.captures.is_some() && has_phase_captures {
            return Err(HighlightError::ConflictingCaptures {
                rule: path.to_string(),
            });
        }

        if let Some(include) = &raw.include {
            if raw.match_.is_some() || raw.begin.is_some() || raw.end.is_some() || raw.patterns.is_some() {
                return Err(malformed(path, "`include` cannot be combined with a matching mode"));
            }
            return parse_include(include).map(RuleKind::Include);
        }

        if let Some(pattern) = &raw.match_ {
            if raw.begin.is_some() || raw.end.is_some() {
                return Err(malformed(path, "`match` cannot be combined with `begin`/`end`"));
            }
            if raw.patterns.is_some() {
                return Err(malformed(path, "`match` rules cannot have child `patterns`"));
            }
            if has_phase_captures {
                return Err(malformed(path, "`beginCaptures`/`endCaptures` need a `begin`/`end` pair"));
            }
            return Ok(RuleKind::Match {
                regex: compile(pattern, path)?,
                captures: capture_map(raw.captures.as_ref(), path)?,
            });
        }

        match (&raw.begin, &raw.end) {
            (Some(begin), Some(end)) => {
                let patterns = match &raw.patterns {
                    Some(children) => self.add_list(children, &format!("{}.patterns", path))?,
                    None => Vec::new(),
                };
                let (begin_captures, end_captures) = match &raw.captures {
                    Some(shared) => {
                        let map = capture_map(Some(shared), path)?;
                        (map.clone(), map)
                    }
                    None => (
                        capture_map(raw.begin_captures.as_ref(), path)?,
                        capture_map(raw.end_captures.as_ref(), path)?,
                    ),
                };
                Ok(RuleKind::Region(Region {
                    begin: compile(begin, path)?,
                    end: compile(end, path)?,
                    content_name: raw.content_name.clone(),
                    begin_captures,
                    end_captures,
                    patterns,
                }))
            }
            (Some(_), None) => Err(malformed(path, "`begin` without `end`")),
            (None, Some(_)) => Err(malformed(path, "`end` without `begin`")),
            (None, None) => match &raw.patterns {
                Some(children) => {
                    if raw.captures.is_some() || has_phase_captures {
                        return Err(malformed(path, "container rules cannot have captures"));
                    }
                    let patterns = self.add_list(children, &format!("{}.patterns", path))?;
                    Ok(RuleKind::Container { patterns })
                }
                None => Err(malformed(
                    path,
                    "rule needs one of `match`, `begin`/`end`, `patterns` or `include`",
                )),
            },
        }
    }
}

fn parse_include(include: &str) -> Result<Include> {
    if let Some(name) = include.strip_prefix('#') {
        return Ok(Include::Repository(name.to_string()));
    }
    match include {
        "$self" | "$base" => Ok(Include::Root),
        // Cross-grammar includes are not supported
        _ => Err(HighlightError::UnresolvedInclude(include.to_string())),
    }
}

fn capture_map(raw: Option<&RawCaptures>, path: &str) -> Result<CaptureMap> {
    let mut map = CaptureMap::new();
    let Some(raw) = raw else {
        return Ok(map);
    };
    for (key, capture) in raw {
        let index = key
            .trim()
            .parse::<usize>()
            .map_err(|_| HighlightError::InvalidCaptureIndex {
                rule: path.to_string(),
                index: key.clone(),
            })?;
        if let Some(name) = &capture.name {
            map.insert(index, name.clone());
        }
    }
    Ok(map)
}
