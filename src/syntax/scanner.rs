//! Match scanner
//!
//! Runs every regex of every active rule over the complete text once and
//! keeps all hits in a single sorted vector. The tokenizer reads that vector
//! through index cursors at every nesting level instead of rescanning.

use std::cmp::Reverse;
use std::ops::Range;

use regex::Regex;

use super::grammar::{Grammar, RuleId, RuleKind};

/// Which regex of a rule produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Begin,
    Match,
    End,
}

impl Phase {
    /// Rank among candidates of equal start and length; lower sorts first.
    /// A region's end wins over anything starting at the same place.
    fn tie_rank(self) -> u8 {
        match self {
            Phase::End => 0,
            Phase::Begin | Phase::Match => 1,
        }
    }
}

/// One regex hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub rule: RuleId,
    pub phase: Phase,
    pub start: usize,
    pub end: usize,
    /// Absolute byte range of each group; index 0 is the whole match
    groups: Vec<Option<Range<usize>>>,
}

impl MatchCandidate {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Byte range of a capture group, if it participated in the match
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        self.groups.get(index).cloned().flatten()
    }
}

/// All candidates of one scan, ordered by start, then longest first
#[derive(Debug, Clone, Default)]
pub struct MatchStream {
    candidates: Vec<MatchCandidate>,
}

impl MatchStream {
    pub fn get(&self, index: usize) -> Option<&MatchCandidate> {
        self.candidates.get(index)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchCandidate> {
        self.candidates.iter()
    }
}

/// Scan `text` with every rule the grammar can ever activate.
#[tracing::instrument(level = "debug", skip_all, fields(scope = grammar.scope_name(), len = text.len()))]
pub fn scan(grammar: &Grammar, text: &str) -> MatchStream {
    scan_rules(grammar, grammar.scan_order(), text)
}

/// Scan `text` with the given rules.
pub fn scan_rules(grammar: &Grammar, rules: &[RuleId], text: &str) -> MatchStream {
    let mut candidates = Vec::new();

    for &id in rules {
        match &grammar.rule(id).kind {
            RuleKind::Match { regex, .. } => {
                search(regex, id, Phase::Match, text, &mut candidates);
            }
            RuleKind::Region(region) => {
                search(&region.begin, id, Phase::Begin, text, &mut candidates);
                search(&region.end, id, Phase::End, text, &mut candidates);
            }
            RuleKind::Container { .. } | RuleKind::Include(_) => {}
        }
    }

    // Stable: equal keys keep grammar discovery order
    candidates.sort_by_key(|c| (c.start, Reverse(c.len()), c.phase.tie_rank()));

    tracing::debug!(candidates = candidates.len(), "scan complete");
    MatchStream { candidates }
}

/// Report every match of `regex` in `text`, including an empty match that
/// starts where the previous match ended.
fn search(regex: &Regex, rule: RuleId, phase: Phase, text: &str, out: &mut Vec<MatchCandidate>) {
    let mut locations = regex.capture_locations();
    let mut at = 0;

    while at <= text.len() {
        let Some(whole) = regex.captures_read_at(&mut locations, text, at) else {
            break;
        };
        let groups = (0..locations.len())
            .map(|i| locations.get(i).map(|(start, end)| start..end))
            .collect();
        out.push(MatchCandidate {
            rule,
            phase,
            start: whole.start(),
            end: whole.end(),
            groups,
        });

        at = if whole.is_empty() {
            // Step over one char so the same empty match is not found again
            text[whole.end()..]
                .chars()
                .next()
                .map_or(text.len() + 1, |c| whole.end() + c.len_utf8())
        } else {
            whole.end()
        };
    }
}
