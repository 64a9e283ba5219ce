//! Word lists used by the code/prose heuristic.

use std::collections::HashSet;

use crate::patterns::IDENT_RE;

/// Keywords that rarely appear in prose: general-purpose, SQL, Cypher and shell.
pub const STRONG_CODE_KEYWORDS: &[&str] = &[
    "import", "export", "def", "class", "const", "let", "var", "async", "await", "yield",
    "lambda", "implements", "interface", "enum", "struct", "union", "public", "private",
    "protected", "static", "final", "void", "null", "undefined", "extends", "super", "this",
    "self", "typeof", "instanceof", "new", "delete", "throw", "throws", "catch", "finally", "try",
    // SQL
    "select", "from", "where", "join", "inner", "left", "right", "outer", "on", "group", "order",
    "having", "distinct", "limit", "offset", "intersect", "create", "alter", "drop", "insert",
    "update", "truncate",
    // Cypher
    "match", "merge", "optional", "with", "unwind", "return", "skip", "collect", "load", "csv",
    "headers", "node", "relationship", "path", "call",
    // Shell
    "echo", "cd", "ls", "mkdir", "chmod", "grep", "awk", "sed", "ps", "kill",
];

/// Keywords common to both code and English.
pub const WEAK_CODE_KEYWORDS: &[&str] = &[
    "function", "return", "elif", "while", "do", "switch", "case", "break", "continue", "and",
    "or", "not", "true", "false", "int", "string", "bool", "boolean", "float", "double", "char",
    "end",
];

/// Words that mark running prose.
pub const STRONG_PROSE_WORDS: &[&str] = &[
    "the", "but", "with", "into", "during", "including", "until", "against", "among",
    "throughout", "despite", "towards", "upon", "concerning", "about", "over", "after",
    "section", "chapter", "figure", "listing", "example", "shown", "explained", "becomes",
    "together", "everything", "because", "however", "therefore", "meanwhile", "furthermore",
    "moreover", "although", "whereas", "nevertheless", "consequently", "subsequently",
];

/// Words frequent in both contexts; they lean towards prose.
pub const AMBIGUOUS_WORDS: &[&str] = &[
    "and", "or", "not", "in", "for", "of", "at", "by", "from", "up", "to", "is", "as", "out",
    "with", "will", "can", "may", "should", "would", "if", "then", "else", "when", "where",
    "while", "before", "after", "function", "data", "file", "name", "value", "number", "text",
    "item",
];

/// Word-character tokens of lowercased text.
pub fn tokens(text_lower: &str) -> impl Iterator<Item = &str> {
    IDENT_RE.find_iter(text_lower).map(|m| m.as_str())
}

/// Purely alphabetic tokens, in order (repeats kept).
pub fn words(text_lower: &str) -> Vec<&str> {
    tokens(text_lower)
        .filter(|t| t.bytes().all(|b| b.is_ascii_alphabetic()))
        .collect()
}

/// Number of distinct keywords from `list` that occur as whole words.
pub fn distinct_keywords(text_lower: &str, list: &[&str]) -> usize {
    let present: HashSet<&str> = tokens(text_lower).collect();
    let unique: HashSet<&&str> = list.iter().collect();
    unique.into_iter().filter(|k| present.contains(**k)).count()
}

/// Code score contributed by the number of distinct strong keywords.
///
/// Non-decreasing in `count`.
pub fn strong_keyword_bonus(count: usize) -> i32 {
    match count {
        6.. => 140,
        4..=5 => 80,
        3 => 40,
        2 => 20,
        1 => 8,
        0 => 0,
    }
}

/// Prose score for the share of strong prose words.
pub fn strong_prose_bonus(ratio: f64) -> i32 {
    match ratio {
        r if r > 0.25 => 50,
        r if r > 0.15 => 40,
        r if r > 0.08 => 30,
        r if r > 0.05 => 25,
        r if r > 0.02 => 15,
        r if r > 0.01 => 10,
        _ => 0,
    }
}

/// Prose score for the share of ambiguous words.
pub fn ambiguous_bonus(ratio: f64) -> i32 {
    match ratio {
        r if r > 0.4 => 25,
        r if r > 0.3 => 20,
        r if r > 0.2 => 15,
        r if r > 0.15 => 12,
        r if r > 0.1 => 8,
        r if r > 0.05 => 5,
        _ => 0,
    }
}
