//! Scope-based themes
//!
//! A theme maps scope selectors to styles. A selector matches a scope equal
//! to it or extending it with further dot-separated segments, so `string`
//! matches `string.quoted.double.json` but not `stringy`.

use super::highlighter::Run;
use super::style::{Color, Style};
use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ThemeRule {
    selector: String,
    style: Style,
}

/// Scope selector -> style table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    rules: Vec<ThemeRule>,
}

impl Theme {
    /// Create a theme with no rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Default theme layered with the `[theme]` table of a config
    pub fn from_config(config: &Config) -> Self {
        let mut theme = Self::default();
        for (selector, style) in &config.theme {
            theme.set(selector, *style);
        }
        theme
    }

    /// Add or replace the style for a selector
    pub fn set(&mut self, selector: &str, style: Style) {
        match self.rules.iter_mut().find(|rule| rule.selector == selector) {
            Some(rule) => rule.style = style,
            None => self.rules.push(ThemeRule {
                selector: selector.to_string(),
                style,
            }),
        }
    }

    /// Builder form of [`Theme::set`]
    pub fn with_rule(mut self, selector: &str, style: Style) -> Self {
        self.set(selector, style);
        self
    }

    /// Resolve the style of a scope stack (innermost scope first).
    ///
    /// The innermost scope with any matching selector decides; among its
    /// matches the longest selector wins.
    pub fn style_for(&self, scopes: &[String]) -> Style {
        for scope in scopes {
            let best = self
                .rules
                .iter()
                .filter(|rule| selector_matches(&rule.selector, scope))
                .max_by_key(|rule| rule.selector.len());
            if let Some(rule) = best {
                return rule.style;
            }
        }
        Style::default()
    }

    /// Pair each run with its resolved style
    pub fn style_runs<'t>(&self, runs: &[Run<'t>]) -> Vec<(Style, &'t str)> {
        runs.iter()
            .map(|run| (self.style_for(&run.scopes), run.value))
            .collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::empty()
            .with_rule("comment", Style::fg(Color::BrightBlack).with_italic())
            .with_rule("string", Style::fg(Color::Green))
            .with_rule("constant", Style::fg(Color::BrightRed))
            .with_rule("constant.numeric", Style::fg(Color::Cyan))
            .with_rule("constant.character", Style::fg(Color::Green))
            .with_rule("constant.character.escape", Style::fg(Color::BrightYellow))
            .with_rule("keyword", Style::fg(Color::Magenta).with_bold())
            .with_rule("keyword.operator", Style::fg(Color::BrightWhite))
            .with_rule("storage.type", Style::fg(Color::Yellow))
            .with_rule("support.type", Style::fg(Color::Yellow))
            .with_rule("entity.name.type", Style::fg(Color::Yellow))
            .with_rule("entity.name.function", Style::fg(Color::Blue))
            .with_rule("entity.name.section", Style::fg(Color::Yellow).with_bold())
            .with_rule("entity.name.label", Style::fg(Color::Yellow).with_underline())
            .with_rule("entity.name.namespace", Style::fg(Color::BrightBlue))
            .with_rule("entity.other.attribute-name", Style::fg(Color::BrightBlue))
            .with_rule("meta.preprocessor", Style::fg(Color::BrightMagenta))
            .with_rule("support.function.macro", Style::fg(Color::BrightCyan))
            .with_rule("variable.other.key", Style::fg(Color::Blue))
            .with_rule("invalid", Style::fg(Color::Red).with_underline())
            .with_rule("punctuation", Style::default())
    }
}

fn selector_matches(selector: &str, scope: &str) -> bool {
    match scope.strip_prefix(selector) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
