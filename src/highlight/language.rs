//! Language detection for code blocks.
//!
//! Order: explicit hint, then a signature table of common languages, then
//! syntect's first-line guesser, then plain text.

use std::sync::LazyLock;

use syntect::parsing::{SyntaxReference, SyntaxSet};

/// Syntax definitions bundled with syntect, loaded once.
pub static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// A detected language.
#[derive(Debug, Clone, Copy)]
pub struct Language {
    /// Display name (syntect syntax name, or "Plain Text").
    pub name: &'static str,
    /// Syntax to tokenize with; `None` for plain text.
    pub syntax: Option<&'static SyntaxReference>,
}

impl Language {
    pub const PLAIN: Language = Language {
        name: "Plain Text",
        syntax: None,
    };

    fn from_syntax(syntax: &'static SyntaxReference) -> Self {
        if syntax.name == "Plain Text" {
            return Self::PLAIN;
        }
        Language {
            name: syntax.name.as_str(),
            syntax: Some(syntax),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.syntax.is_none()
    }
}

/// Hint spellings that differ from syntect's tokens.
///
/// Each maps to a chain of syntect tokens tried in order; an empty chain
/// means plain text.
fn hint_aliases(hint: &str) -> Option<&'static [&'static str]> {
    Some(match hint {
        "text" | "plain" | "plaintext" | "none" | "txt" | "csv" | "console" | "output" => &[],
        "typescript" | "ts" | "tsx" => &["ts", "js"],
        "javascript" | "jsx" | "node" => &["js"],
        "cypher" | "neo4j" => &["cypher", "sql"],
        "shell" | "bash" | "sh" | "zsh" => &["sh", "bash"],
        "c++" | "cxx" => &["cpp"],
        "c#" | "csharp" => &["cs"],
        "golang" => &["go"],
        "python3" | "py3" => &["py"],
        "html5" | "xhtml" => &["html"],
        _ => return None,
    })
}

fn find_token(token: &str) -> Option<&'static SyntaxReference> {
    SYNTAXES.find_syntax_by_token(token)
}

fn resolve_chain(chain: &[&str]) -> Option<Language> {
    if chain.is_empty() {
        return Some(Language::PLAIN);
    }
    chain.iter().find_map(|t| find_token(t)).map(Language::from_syntax)
}

/// Resolve an explicit language hint such as `python` or `language-js`'s `js`.
pub fn resolve_hint(hint: &str) -> Option<Language> {
    let hint = hint.trim().to_ascii_lowercase();
    if hint.is_empty() {
        return None;
    }
    match hint_aliases(&hint) {
        Some(chain) => resolve_chain(chain),
        None => find_token(&hint).map(Language::from_syntax),
    }
}

/// Distinctive snippets of a language.
struct Signature {
    /// Syntect tokens to try, in order; empty means plain text.
    tokens: &'static [&'static str],
    matches: fn(&str, &str) -> bool,
}

fn java(lower: &str, _: &str) -> bool {
    ["public class", "private class", "public static void main", "system.out.print"]
        .iter()
        .any(|s| lower.contains(s))
}

fn python(lower: &str, _: &str) -> bool {
    ["def ", "import ", "print("].iter().any(|s| lower.contains(s))
}

fn typescript(lower: &str, _: &str) -> bool {
    [": string", ": number", ": boolean", "interface ", "export type "]
        .iter()
        .any(|s| lower.contains(s))
}

fn javascript(lower: &str, _: &str) -> bool {
    ["function ", "console.log", "var ", "let ", "=> {"]
        .iter()
        .any(|s| lower.contains(s))
}

fn xml(lower: &str, _: &str) -> bool {
    let trimmed = lower.trim_start();
    trimmed.starts_with("<?xml") || (trimmed.starts_with('<') && lower.contains("</"))
}

fn c(lower: &str, _: &str) -> bool {
    ["#include", "int main(", "printf("].iter().any(|s| lower.contains(s))
}

fn cypher(lower: &str, raw: &str) -> bool {
    let clause = ["create (", "match (", "load csv", "merge (", "return ", "where "]
        .iter()
        .any(|s| lower.contains(s));
    let graph = ["businessobject", "neo4j", "cypher", "graph", "objectid", "row."]
        .iter()
        .any(|s| lower.contains(s))
        || raw.contains(':')
        || raw.contains("[:");
    clause && graph
}

fn csv(_: &str, raw: &str) -> bool {
    raw.contains(',')
        && raw.contains('\n')
        && raw.lines().filter(|l| l.contains(',')).count() >= 2
}

/// Checked in order; the first match wins.
static SIGNATURES: &[Signature] = &[
    Signature {
        tokens: &["java"],
        matches: java,
    },
    Signature {
        tokens: &["py"],
        matches: python,
    },
    Signature {
        tokens: &["ts", "js"],
        matches: typescript,
    },
    Signature {
        tokens: &["js"],
        matches: javascript,
    },
    Signature {
        tokens: &["xml"],
        matches: xml,
    },
    Signature {
        tokens: &["c"],
        matches: c,
    },
    Signature {
        tokens: &["cypher", "sql"],
        matches: cypher,
    },
    Signature {
        tokens: &[],
        matches: csv,
    },
];

fn by_signature(code: &str) -> Option<Language> {
    let lower = code.to_lowercase();
    SIGNATURES
        .iter()
        .find(|sig| (sig.matches)(&lower, code))
        .and_then(|sig| resolve_chain(sig.tokens))
}

fn by_first_line(code: &str) -> Option<Language> {
    let first = code.lines().find(|l| !l.trim().is_empty())?;
    SYNTAXES
        .find_syntax_by_first_line(first)
        .map(Language::from_syntax)
}

/// Detect the language of `code`.
///
/// Returns the language and, when the hint could not be resolved, the hint
/// itself so the caller can report it.
pub fn detect(code: &str, hint: Option<&str>) -> (Language, Option<String>) {
    let mut unresolved = None;
    if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
        match resolve_hint(hint) {
            Some(language) => return (language, None),
            None => unresolved = Some(hint.to_string()),
        }
    }

    let language = by_signature(code)
        .or_else(|| by_first_line(code))
        .unwrap_or(Language::PLAIN);
    (language, unresolved)
}
