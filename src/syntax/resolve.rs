//! Include resolution
//!
//! Expands `include` references and container rules into the flat set of
//! matching rules active at one nesting level. Each pass keeps a visited set
//! keyed by [`RuleId`], so a rule enters a set at most once and cyclic
//! includes terminate. The grammar itself is never modified.

use std::collections::{HashMap, HashSet};

use super::grammar::{Grammar, Include, RuleId, RuleKind};
use crate::error::{HighlightError, Result};

/// Matching rules (`match` or `begin`/`end`) usable at one nesting level
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    rules: Vec<RuleId>,
    members: HashSet<RuleId>,
}

impl ActiveSet {
    /// Rules in resolution order
    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    /// Check whether a rule is active at this level
    pub fn contains(&self, id: RuleId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn insert(&mut self, id: RuleId) {
        if self.members.insert(id) {
            self.rules.push(id);
        }
    }
}

/// Resolved rule sets for a whole grammar
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    root: ActiveSet,
    regions: HashMap<RuleId, ActiveSet>,
    scan_order: Vec<RuleId>,
}

impl Resolution {
    pub fn root(&self) -> &ActiveSet {
        &self.root
    }

    pub fn region(&self, id: RuleId) -> Option<&ActiveSet> {
        self.regions.get(&id)
    }

    /// Union of all active sets, in the order rules were first discovered
    pub fn scan_order(&self) -> &[RuleId] {
        &self.scan_order
    }
}

/// Resolve the root set and the child set of every reachable region.
#[tracing::instrument(level = "debug", skip_all, fields(scope = grammar.scope_name()))]
pub fn resolve(grammar: &Grammar) -> Result<Resolution> {
    let root = resolve_set(grammar, grammar.patterns())?;

    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();
    let mut pending: Vec<RuleId> = Vec::new();

    for &id in root.rules() {
        if seen.insert(id) {
            resolution.scan_order.push(id);
            pending.push(id);
        }
    }
    resolution.root = root;

    // Breadth-first over regions so discovery order follows nesting depth
    let mut next = 0;
    while next < pending.len() {
        let id = pending[next];
        next += 1;

        let Some(region) = grammar.rule(id).region() else {
            continue;
        };
        if resolution.regions.contains_key(&id) {
            continue;
        }

        let set = resolve_set(grammar, &region.patterns)?;
        for &child in set.rules() {
            if seen.insert(child) {
                resolution.scan_order.push(child);
                pending.push(child);
            }
        }
        tracing::trace!(region = id.index(), active = set.len(), "resolved region");
        resolution.regions.insert(id, set);
    }

    Ok(resolution)
}

/// Resolve one pattern list into an active set.
pub fn resolve_set(grammar: &Grammar, patterns: &[RuleId]) -> Result<ActiveSet> {
    let mut set = ActiveSet::default();
    let mut visited = HashSet::new();
    for &id in patterns {
        expand(grammar, id, &mut visited, &mut set)?;
    }
    Ok(set)
}

fn expand(
    grammar: &Grammar,
    id: RuleId,
    visited: &mut HashSet<RuleId>,
    set: &mut ActiveSet,
) -> Result<()> {
    if !visited.insert(id) {
        return Ok(());
    }

    match &grammar.rule(id).kind {
        RuleKind::Match { .. } | RuleKind::Region(_) => set.insert(id),
        RuleKind::Container { patterns } => {
            for &child in patterns {
                expand(grammar, child, visited, set)?;
            }
        }
        RuleKind::Include(Include::Repository(name)) => {
            let target = grammar
                .repository_rule(name)
                .ok_or_else(|| HighlightError::UnresolvedInclude(format!("#{}", name)))?;
            expand(grammar, target, visited, set)?;
        }
        RuleKind::Include(Include::Root) => {
            for &child in grammar.patterns() {
                expand(grammar, child, visited, set)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paren_grammar() -> Grammar {
        Grammar::from_value(json!({
            "scopeName": "source.abc",
            "patterns": [{ "include": "#expression" }],
            "repository": {
                "expression": {
                    "patterns": [{ "include": "#letter" }, { "include": "#paren-expression" }]
                },
                "letter": { "match": "a|b|c", "name": "keyword.letter" },
                "paren-expression": {
                    "begin": "\\(",
                    "end": "\\)",
                    "name": "expression.group",
                    "patterns": [{ "include": "#expression" }]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_container_includes_flatten_in_place() {
        let grammar = paren_grammar();
        let letter = grammar.repository_rule("letter").unwrap();
        let paren = grammar.repository_rule("paren-expression").unwrap();

        assert_eq!(grammar.root_set().rules(), &[letter, paren]);
        assert!(grammar.root_set().contains(letter));
    }

    #[test]
    fn test_recursive_region_resolves_once() {
        let grammar = paren_grammar();
        let letter = grammar.repository_rule("letter").unwrap();
        let paren = grammar.repository_rule("paren-expression").unwrap();

        let inner = grammar.region_set(paren).unwrap();
        assert_eq!(inner.rules(), &[letter, paren]);
        assert_eq!(grammar.scan_order(), &[letter, paren]);
    }

    #[test]
    fn test_cyclic_repository_includes_terminate() {
        let grammar = Grammar::from_value(json!({
            "scopeName": "source.cycle",
            "patterns": [{ "include": "#a" }],
            "repository": {
                "a": { "patterns": [{ "include": "#b" }, { "match": "x", "name": "x" }] },
                "b": { "patterns": [{ "include": "#a" }, { "match": "y", "name": "y" }] }
            }
        }))
        .unwrap();

        let names: Vec<_> = grammar
            .root_set()
            .rules()
            .iter()
            .map(|&id| grammar.rule(id).name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn test_self_include_uses_root_patterns() {
        let grammar = Grammar::from_value(json!({
            "scopeName": "source.nest",
            "patterns": [
                { "match": "\\d+", "name": "constant.numeric" },
                {
                    "begin": "\\[",
                    "end": "\\]",
                    "name": "meta.list",
                    "patterns": [{ "include": "$self" }]
                }
            ]
        }))
        .unwrap();

        let number = grammar.patterns()[0];
        let list = grammar.patterns()[1];
        assert_eq!(grammar.region_set(list).unwrap().rules(), &[number, list]);
    }

    #[test]
    fn test_region_without_children_has_empty_set() {
        let grammar = Grammar::from_value(json!({
            "scopeName": "source.c",
            "patterns": [{ "begin": "/\\*", "end": "\\*/", "name": "comment.block" }]
        }))
        .unwrap();

        let comment = grammar.patterns()[0];
        assert!(grammar.region_set(comment).unwrap().is_empty());
    }

    #[test]
    fn test_nested_region_children_are_scanned() {
        let grammar = Grammar::from_value(json!({
            "scopeName": "source.s",
            "patterns": [{
                "begin": "\"",
                "end": "\"",
                "name": "string",
                "patterns": [{ "match": "\\\\.", "name": "escape" }]
            }]
        }))
        .unwrap();

        let string = grammar.patterns()[0];
        let escape = grammar.region_set(string).unwrap().rules()[0];
        assert_eq!(grammar.scan_order(), &[string, escape]);
        assert!(!grammar.root_set().contains(escape));
    }
}
