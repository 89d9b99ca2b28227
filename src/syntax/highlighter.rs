//! Span flattening
//!
//! Turns nested scope spans into a flat list of runs that covers the input
//! exactly once, the form a renderer consumes.

use serde::Serialize;

use super::grammar::Grammar;
use super::tokenizer::{ScopeSpan, Tokenizer};

/// A scope stack over a literal piece of the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run<'t> {
    /// Scope tags, innermost first
    pub scopes: Vec<String>,
    pub value: &'t str,
}

/// Flatten `spans` over `text`.
///
/// `spans` must be ordered the way [`Tokenizer::tokenize`] orders them (by
/// start, enclosing spans first). Text not covered by any span gets
/// `default_scopes`. The concatenated run values always equal `text`: spans
/// are clamped to their parent and offsets inside a char are moved back to
/// its start.
pub fn flatten<'t>(text: &'t str, spans: &[ScopeSpan], default_scopes: &[String]) -> Vec<Run<'t>> {
    let mut runs = Vec::new();
    // Open spans as (end, scopes); the bottom entry covers the whole text
    let mut open: Vec<(usize, &[String])> = vec![(text.len(), default_scopes)];
    let mut cursor = 0;

    for span in spans {
        // A span is a child of the innermost open span that ends past its start
        while open.len() > 1 {
            let Some(&(end, scopes)) = open.last() else {
                break;
            };
            if span.start < end {
                break;
            }
            push_run(text, cursor, end, scopes, &mut runs);
            cursor = cursor.max(end);
            open.pop();
        }

        let Some(&(parent_end, parent_scopes)) = open.last() else {
            break;
        };
        let start = char_floor(text, span.start).clamp(cursor, parent_end);
        let end = char_floor(text, span.end).clamp(start, parent_end);
        if start < end {
            push_run(text, cursor, start, parent_scopes, &mut runs);
            cursor = start;
            open.push((end, span.scopes.as_slice()));
        }
    }

    while let Some((end, scopes)) = open.pop() {
        push_run(text, cursor, end, scopes, &mut runs);
        cursor = cursor.max(end);
    }
    runs
}

/// Largest char boundary at or before `offset`
fn char_floor(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn push_run<'t>(text: &'t str, start: usize, end: usize, scopes: &[String], runs: &mut Vec<Run<'t>>) {
    if start >= end {
        return;
    }
    if let Some(value) = text.get(start..end) {
        runs.push(Run {
            scopes: scopes.to_vec(),
            value,
        });
    }
}

/// Coalesce neighbouring runs that carry identical scope stacks.
///
/// `runs` must partition `text` in order from offset 0, as [`flatten`]
/// returns them. A run that does not line up with `text` is kept unmerged.
pub fn merge_runs<'t>(text: &'t str, runs: Vec<Run<'t>>) -> Vec<Run<'t>> {
    let mut merged: Vec<Run<'t>> = Vec::with_capacity(runs.len());
    // Start offset of the last merged run
    let mut last_start = 0;
    let mut offset = 0;

    for run in runs {
        let len = run.value.len();
        let joined = match merged.last() {
            Some(last) if last.scopes == run.scopes => text
                .get(last_start..offset + len)
                .filter(|joined| joined.starts_with(last.value) && joined.ends_with(run.value)),
            _ => None,
        };
        match joined {
            Some(joined) => {
                if let Some(last) = merged.last_mut() {
                    last.value = joined;
                }
            }
            None => {
                last_start = offset;
                merged.push(run);
            }
        }
        offset += len;
    }
    merged
}

/// Tokenizes and flattens text against one grammar
#[derive(Debug, Clone)]
pub struct Highlighter<'g> {
    tokenizer: Tokenizer<'g>,
    default_scopes: Vec<String>,
    merge_adjacent: bool,
}

impl<'g> Highlighter<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            tokenizer: Tokenizer::new(grammar),
            default_scopes: vec![grammar.scope_name().to_string()],
            merge_adjacent: false,
        }
    }

    /// Builder: coalesce adjacent runs with identical scopes
    pub fn with_merge_adjacent(mut self, merge: bool) -> Self {
        self.merge_adjacent = merge;
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.tokenizer.grammar()
    }

    /// Highlight a complete document
    pub fn highlight<'t>(&self, text: &'t str) -> Vec<Run<'t>> {
        let spans = self.tokenizer.tokenize(text);
        let runs = flatten(text, &spans, &self.default_scopes);
        if self.merge_adjacent {
            merge_runs(text, runs)
        } else {
            runs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scopes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn span(names: &[&str], start: usize, end: usize) -> ScopeSpan {
        ScopeSpan {
            scopes: scopes(names),
            start,
            end,
        }
    }

    fn run<'t>(names: &[&str], value: &'t str) -> Run<'t> {
        Run {
            scopes: scopes(names),
            value,
        }
    }

    fn string_grammar() -> Grammar {
        Grammar::from_value(json!({
            "scopeName": "source.abc",
            "patterns": [{ "include": "#string" }],
            "repository": {
                "string": {
                    "begin": "\"",
                    "end": "\"",
                    "name": "string.quoted.double.untitled",
                    "patterns": [{ "include": "#escape" }]
                },
                "escape": { "match": "\\\\.", "name": "constant.character.escape.untitled" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_escaped_string_spans() {
        let code = r#""Hello \"World\"!""#;
        let string = ["string.quoted.double.untitled", "source.abc"];
        let escape = ["constant.character.escape.untitled", "string.quoted.double.untitled", "source.abc"];
        let spans = vec![span(&string, 0, 18), span(&escape, 7, 9), span(&escape, 14, 16)];

        let result = flatten(code, &spans, &scopes(&["source.abc"]));
        assert_eq!(
            result,
            vec![
                run(&string, r#""Hello "#),
                run(&escape, r#"\""#),
                run(&string, "World"),
                run(&escape, r#"\""#),
                run(&string, r#"!""#),
            ]
        );
    }

    #[test]
    fn test_highlight_escaped_string_falls_back_after_quote() {
        let grammar = string_grammar();
        let code = r#""Hello \"World\"!" end"#;
        let string = ["string.quoted.double.untitled", "source.abc"];
        let escape = ["constant.character.escape.untitled", "string.quoted.double.untitled", "source.abc"];

        let result = Highlighter::new(&grammar).highlight(code);
        assert_eq!(
            result,
            vec![
                run(&string, r#""Hello "#),
                run(&escape, r#"\""#),
                run(&string, "World"),
                run(&escape, r#"\""#),
                run(&string, r#"!""#),
                run(&["source.abc"], " end"),
            ]
        );
    }

    #[test]
    fn test_highlight_begin_end_captures() {
        let grammar = Grammar::from_value(json!({
            "scopeName": "source.abc",
            "patterns": [{
                "begin": "\\(",
                "end": "\\)",
                "beginCaptures": { "0": { "name": "open" } },
                "endCaptures": { "0": { "name": "close" } },
                "name": "group"
            }]
        }))
        .unwrap();

        let result = Highlighter::new(&grammar).highlight("( )");
        assert_eq!(
            result,
            vec![
                run(&["open", "group", "source.abc"], "("),
                run(&["group", "source.abc"], " "),
                run(&["close", "group", "source.abc"], ")"),
            ]
        );
    }

    #[test]
    fn test_gaps_use_default_scopes() {
        let spans = vec![span(&["a"], 2, 3), span(&["b"], 5, 6)];
        let result = flatten("..a..b..", &spans, &scopes(&["root"]));
        assert_eq!(
            result,
            vec![
                run(&["root"], ".."),
                run(&["a"], "a"),
                run(&["root"], ".."),
                run(&["b"], "b"),
                run(&["root"], ".."),
            ]
        );
    }

    #[test]
    fn test_no_spans_is_one_default_run() {
        let result = flatten("plain", &[], &scopes(&["root"]));
        assert_eq!(result, vec![run(&["root"], "plain")]);
    }

    #[test]
    fn test_empty_text_has_no_runs() {
        assert!(flatten("", &[], &scopes(&["root"])).is_empty());
    }

    #[test]
    fn test_identical_ranges_use_the_deeper_stack() {
        let spans = vec![span(&["outer", "root"], 0, 2), span(&["inner", "outer", "root"], 0, 2)];
        let result = flatten("ab", &spans, &scopes(&["root"]));
        assert_eq!(result, vec![run(&["inner", "outer", "root"], "ab")]);
    }

    #[test]
    fn test_partial_overlap_is_clamped() {
        // Not produced by the tokenizer, but the output must still partition the text
        let spans = vec![span(&["a"], 0, 3), span(&["b"], 2, 5)];
        let result = flatten("abcdef", &spans, &scopes(&["root"]));

        let joined: String = result.iter().map(|r| r.value).collect();
        assert_eq!(joined, "abcdef");
        assert_eq!(result[0], run(&["a"], "ab"));
    }

    #[test]
    fn test_offsets_inside_a_char_are_moved_to_its_start() {
        // "é" is bytes 0..2
        let spans = vec![span(&["a"], 1, 3)];
        let result = flatten("éx", &spans, &scopes(&["root"]));
        assert_eq!(result, vec![run(&["a"], "éx")]);
    }

    #[test]
    fn test_spans_past_the_text_are_clamped() {
        let spans = vec![span(&["a"], 1, 40), span(&["b"], 30, 50)];
        let result = flatten("abc", &spans, &scopes(&["root"]));
        assert_eq!(result, vec![run(&["root"], "a"), run(&["a"], "bc")]);
    }

    #[test]
    fn test_deeply_nested_spans() {
        let depth = 20_000;
        let text = "x".repeat(depth);
        let spans: Vec<_> = (0..depth).map(|i| span(&["n"], i, depth)).collect();

        let result = flatten(&text, &spans, &scopes(&["root"]));
        assert_eq!(result.len(), depth);
        assert!(result.iter().all(|r| r.value == "x"));
    }

    #[test]
    fn test_merge_skips_runs_from_other_text() {
        let text = "aabb";
        let runs = vec![run(&["x"], "zz"), run(&["x"], "zz")];
        let merged = merge_runs(text, runs);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_adjacent_runs() {
        let text = "aabbcc";
        let runs = vec![
            run(&["x"], "a"),
            run(&["x"], "a"),
            run(&["y"], "bb"),
            run(&["x"], "c"),
            run(&["x"], "c"),
        ];
        let merged = merge_runs(text, runs);
        assert_eq!(merged, vec![run(&["x"], "aa"), run(&["y"], "bb"), run(&["x"], "cc")]);
    }

    #[test]
    fn test_highlighter_merges_when_enabled() {
        let grammar = Grammar::from_value(json!({
            "scopeName": "source.t",
            "patterns": [{ "match": "a", "name": "letter" }]
        }))
        .unwrap();

        let plain = Highlighter::new(&grammar).highlight("aa");
        assert_eq!(plain.len(), 2);

        let merged = Highlighter::new(&grammar).with_merge_adjacent(true).highlight("aa");
        assert_eq!(merged, vec![run(&["letter", "source.t"], "aa")]);
    }

    #[test]
    fn test_multibyte_text_is_sliced_on_char_boundaries() {
        let grammar = string_grammar();
        let result = Highlighter::new(&grammar).highlight("é \"ü\" ß");

        let joined: String = result.iter().map(|r| r.value).collect();
        assert_eq!(joined, "é \"ü\" ß");
        assert_eq!(result[1], run(&["string.quoted.double.untitled", "source.abc"], "\"ü\""));
    }
}
