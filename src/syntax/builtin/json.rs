//! JSON (with comments) grammar

use crate::error::Result;
use crate::syntax::grammar::Grammar;

const JSON_GRAMMAR: &str = r##"{
  "name": "JSON",
  "scopeName": "source.json",
  "fileTypes": ["json", "jsonc", "code-workspace", ".babelrc", ".eslintrc"],
  "foldingStartMarker": "[{\\[]\\s*$",
  "foldingStopMarker": "^\\s*[}\\]]",
  "patterns": [{ "include": "#value" }],
  "repository": {
    "value": {
      "patterns": [
        { "include": "#comments" },
        { "include": "#constant" },
        { "include": "#number" },
        { "include": "#string" },
        { "include": "#array" },
        { "include": "#object" }
      ]
    },
    "comments": {
      "patterns": [
        {
          "begin": "/\\*",
          "end": "\\*/",
          "name": "comment.block.json",
          "captures": { "0": { "name": "punctuation.definition.comment.json" } }
        },
        {
          "match": "(//).*$",
          "name": "comment.line.double-slash.json",
          "captures": { "1": { "name": "punctuation.definition.comment.json" } }
        }
      ]
    },
    "constant": {
      "match": "\\b(?:true|false|null)\\b",
      "name": "constant.language.json"
    },
    "number": {
      "match": "-?(?:0|[1-9][0-9]*)(?:\\.[0-9]+)?(?:[eE][+-]?[0-9]+)?",
      "name": "constant.numeric.json"
    },
    "string": {
      "begin": "\"",
      "end": "\"",
      "name": "string.quoted.double.json",
      "beginCaptures": { "0": { "name": "punctuation.definition.string.begin.json" } },
      "endCaptures": { "0": { "name": "punctuation.definition.string.end.json" } },
      "patterns": [{ "include": "#escape" }]
    },
    "escape": {
      "patterns": [
        {
          "match": "\\\\(?:[\"\\\\/bfnrt]|u[0-9a-fA-F]{4})",
          "name": "constant.character.escape.json"
        },
        {
          "match": "\\\\.",
          "name": "invalid.illegal.unrecognized-string-escape.json"
        }
      ]
    },
    "array": {
      "begin": "\\[",
      "end": "\\]",
      "name": "meta.structure.array.json",
      "beginCaptures": { "0": { "name": "punctuation.definition.array.begin.json" } },
      "endCaptures": { "0": { "name": "punctuation.definition.array.end.json" } },
      "patterns": [
        { "include": "#value" },
        { "match": ",", "name": "punctuation.separator.array.json" }
      ]
    },
    "object": {
      "begin": "\\{",
      "end": "\\}",
      "name": "meta.structure.dictionary.json",
      "beginCaptures": { "0": { "name": "punctuation.definition.dictionary.begin.json" } },
      "endCaptures": { "0": { "name": "punctuation.definition.dictionary.end.json" } },
      "patterns": [
        { "include": "#value" },
        { "match": ":", "name": "punctuation.separator.dictionary.key-value.json" },
        { "match": ",", "name": "punctuation.separator.dictionary.pair.json" }
      ]
    }
  }
}"##;

/// Create the JSON grammar
pub fn json_grammar() -> Result<Grammar> {
    Grammar::from_json(JSON_GRAMMAR)
}
