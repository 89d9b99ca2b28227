//! Recursive tokenizer
//!
//! Walks the globally ordered match stream and rebuilds a valid nesting of
//! scopes from candidates that were produced independently per rule. Each
//! open region is one nesting level on an explicit stack; the level ends at
//! the first `end` candidate of its rule that lies past the consumed text.

use serde::Serialize;

use super::grammar::{CaptureMap, Grammar, Region, RuleId, RuleKind};
use super::resolve::ActiveSet;
use super::scanner::{self, MatchCandidate, MatchStream, Phase};

/// A scope stack over a byte range of the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeSpan {
    /// Scope tags, innermost first
    pub scopes: Vec<String>,
    /// Byte offset where this span starts (inclusive)
    pub start: usize,
    /// Byte offset where this span ends (exclusive)
    pub end: usize,
}

impl ScopeSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if another span lies entirely inside this one
    pub fn contains(&self, other: &ScopeSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Tokenizes text against one grammar
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'g> {
    grammar: &'g Grammar,
}

impl<'g> Tokenizer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Produce the scope spans of `text`.
    ///
    /// Spans are ordered by start, then by end descending, then by stack
    /// depth, so every span precedes the spans nested inside it.
    #[tracing::instrument(level = "debug", skip_all, fields(scope = self.grammar.scope_name(), len = text.len()))]
    pub fn tokenize(&self, text: &str) -> Vec<ScopeSpan> {
        let stream = scanner::scan(self.grammar, text);
        let mut pass = Pass {
            grammar: self.grammar,
            stream: &stream,
            text_len: text.len(),
            spans: Vec::new(),
        };

        pass.run(self.grammar.root_set(), vec![self.grammar.scope_name().to_string()]);

        let mut spans = pass.spans;
        spans.sort_by_key(|span| (span.start, std::cmp::Reverse(span.end), span.scopes.len()));
        tracing::debug!(spans = spans.len(), "tokenized");
        spans
    }
}

/// An open region
struct Frame<'a> {
    rule: RuleId,
    begin: &'a MatchCandidate,
    region: &'a Region,
    /// Resolved child set; `None` if the region has no children
    children: Option<&'a ActiveSet>,
    /// Stack with the region's `name`
    outer: Vec<String>,
    /// Stack with `contentName` as well, used by children
    inner: Vec<String>,
}

/// State of one tokenization pass
struct Pass<'a> {
    grammar: &'a Grammar,
    stream: &'a MatchStream,
    text_len: usize,
    spans: Vec<ScopeSpan>,
}

impl<'a> Pass<'a> {
    /// Consume the whole stream. Open regions live on an explicit stack, so
    /// nesting depth is bounded by memory rather than the call stack.
    fn run(&mut self, root: &'a ActiveSet, root_scopes: Vec<String>) {
        let grammar = self.grammar;
        let stream = self.stream;
        let mut open: Vec<Frame<'a>> = Vec::new();
        let mut index = 0;
        let mut cursor = 0;

        while let Some(candidate) = stream.get(index) {
            index += 1;

            if candidate.start < cursor {
                continue;
            }

            let (active, scopes, enclosing) = match open.last() {
                Some(frame) => (frame.children, frame.inner.as_slice(), Some(frame.rule)),
                None => (Some(root), root_scopes.as_slice(), None),
            };

            if candidate.phase == Phase::End && Some(candidate.rule) == enclosing {
                if let Some(frame) = open.pop() {
                    self.close(frame, Some(candidate));
                }
                cursor = candidate.end;
                continue;
            }
            if !active.is_some_and(|set| set.contains(candidate.rule)) {
                continue;
            }

            match candidate.phase {
                // Not the end of the open region
                Phase::End => {}
                Phase::Match => {
                    self.emit_match(candidate, scopes);
                    cursor = candidate.end;
                }
                Phase::Begin => {
                    let rule = grammar.rule(candidate.rule);
                    let Some(region) = rule.region() else {
                        continue;
                    };
                    let outer = push_scope(rule.name.as_deref(), scopes);
                    let inner = push_scope(region.content_name.as_deref(), &outer);
                    open.push(Frame {
                        rule: candidate.rule,
                        begin: candidate,
                        region,
                        children: grammar.region_set(candidate.rule),
                        outer,
                        inner,
                    });
                    cursor = candidate.end;
                }
            }
        }

        // Unterminated regions run to the end of the text
        while let Some(frame) = open.pop() {
            self.close(frame, None);
        }
    }

    /// Emit the spans of a region once its end is known.
    fn close(&mut self, frame: Frame<'a>, end: Option<&MatchCandidate>) {
        let content_end = end.map_or(self.text_len, |c| c.start);
        let region_end = end.map_or(self.text_len, |c| c.end);
        let named = self.grammar.rule(frame.rule).name.is_some();

        if frame.region.content_name.is_some() {
            self.push_span(frame.inner, frame.begin.end, content_end);
        }
        self.emit_captures(frame.begin, &frame.region.begin_captures, &frame.outer);
        if let Some(end) = end {
            self.emit_captures(end, &frame.region.end_captures, &frame.outer);
        }
        if named {
            self.push_span(frame.outer, frame.begin.start, region_end);
        }
    }

    fn emit_match(&mut self, candidate: &MatchCandidate, scopes: &[String]) {
        let grammar = self.grammar;
        let rule = grammar.rule(candidate.rule);
        let scopes = push_scope(rule.name.as_deref(), scopes);

        if let RuleKind::Match { captures, .. } = &rule.kind {
            self.emit_captures(candidate, captures, &scopes);
        }
        if rule.name.is_some() {
            self.push_span(scopes, candidate.start, candidate.end);
        }
    }

    /// Emit one span per participating capture group. A group nested in an
    /// earlier captured group stacks on top of that group's scope.
    fn emit_captures(&mut self, candidate: &MatchCandidate, captures: &CaptureMap, base: &[String]) {
        let mut placed: Vec<(usize, usize, Vec<String>)> = Vec::new();

        for (&index, scope) in captures {
            let Some(range) = candidate.group(index) else {
                continue;
            };
            if range.is_empty() {
                continue;
            }

            let parent = placed
                .iter()
                .rev()
                .find(|(start, end, _)| *start <= range.start && range.end <= *end)
                .map_or(base, |(_, _, scopes)| scopes.as_slice());
            let scopes = push_scope(Some(scope), parent);

            self.push_span(scopes.clone(), range.start, range.end);
            placed.push((range.start, range.end, scopes));
        }
    }

    fn push_span(&mut self, scopes: Vec<String>, start: usize, end: usize) {
        if start < end {
            self.spans.push(ScopeSpan { scopes, start, end });
        }
    }
}

/// New stack with `scope` on top, or a copy of `scopes` if there is none
fn push_scope(scope: Option<&str>, scopes: &[String]) -> Vec<String> {
    let mut stack = Vec::with_capacity(scopes.len() + 1);
    if let Some(scope) = scope {
        stack.push(scope.to_string());
    }
    stack.extend_from_slice(scopes);
    stack
}
