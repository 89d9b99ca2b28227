//! INI / config file grammar

use crate::error::Result;
use crate::syntax::grammar::Grammar;

const INI_GRAMMAR: &str = r##"{
  "name": "INI",
  "scopeName": "source.ini",
  "fileTypes": ["ini", "cfg", "conf", "properties", ".gitconfig", ".editorconfig"],
  "firstLineMatch": "^\\[[\\w. -]+\\][ \\t]*$",
  "patterns": [
    { "include": "#comment" },
    { "include": "#section" },
    { "include": "#entry" },
    { "include": "#string" },
    { "include": "#boolean" },
    { "include": "#number" }
  ],
  "repository": {
    "comment": {
      "match": "^[ \\t]*([;#]).*$",
      "name": "comment.line.ini",
      "captures": { "1": { "name": "punctuation.definition.comment.ini" } }
    },
    "section": {
      "match": "^[ \\t]*(\\[)([^\\]\\n]*)(\\])",
      "name": "meta.section.ini",
      "captures": {
        "1": { "name": "punctuation.definition.section.begin.ini" },
        "2": { "name": "entity.name.section.ini" },
        "3": { "name": "punctuation.definition.section.end.ini" }
      }
    },
    "entry": {
      "match": "^[ \\t]*([\\w.-]+)[ \\t]*(=|:)",
      "captures": {
        "1": { "name": "variable.other.key.ini" },
        "2": { "name": "keyword.operator.assignment.ini" }
      }
    },
    "string": {
      "begin": "\"",
      "end": "\"|$",
      "name": "string.quoted.double.ini",
      "patterns": [{ "match": "\\\\.", "name": "constant.character.escape.ini" }]
    },
    "boolean": {
      "match": "\\b(?:true|false|yes|no|on|off)\\b",
      "name": "constant.language.boolean.ini"
    },
    "number": {
      "match": "\\b-?[0-9]+(?:\\.[0-9]+)?\\b",
      "name": "constant.numeric.ini"
    }
  }
}"##;

/// Create the INI grammar
pub fn ini_grammar() -> Result<Grammar> {
    Grammar::from_json(INI_GRAMMAR)
}
