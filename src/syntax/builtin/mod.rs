//! Built-in grammars
//!
//! Each grammar is stored as TextMate JSON and goes through the regular
//! loader, so a broken definition fails the same way a user grammar would.

mod ini;
mod json;

use super::grammar::Grammar;
use crate::error::Result;

/// Get all built-in grammars
pub fn all_grammars() -> Result<Vec<Grammar>> {
    Ok(vec![json::json_grammar()?, ini::ini_grammar()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_build() {
        let grammars = all_grammars().unwrap();
        let scopes: Vec<_> = grammars.iter().map(|g| g.scope_name()).collect();
        assert_eq!(scopes, vec!["source.json", "source.ini"]);
    }
}
