//! Cached regex patterns for chapter classification and layout.
//!
//! Uses LazyLock to compile patterns once on first use.

use regex_lite::Regex;
use std::sync::LazyLock;

// === Text patterns ===

/// Matches absolute http(s) URLs up to whitespace or a closing bracket
pub static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)\]}]+").unwrap());

/// Matches a footnote marker such as `[12]` or `^3`
pub static FOOTNOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]|\^\d+").unwrap());

/// Matches a code keyword used as a whole word and followed by whitespace
pub static CODE_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:import|class|def|function|var|const|let|public|private)\s").unwrap()
});

/// Matches chapter/part headers, list markers and bullet glyphs at the start of a line
pub static STRUCTURAL_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Chapter|CHAPTER|Part|PART|\d+\.|(?:I|II|III|IV|V)\.|[A-J]\.|[*\-•◦▪▫])")
        .unwrap()
});

/// Matches a caption prefix followed by a number (`Figure 3`, `Listing 2.1`)
pub static CAPTION_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Figure|Fig\.|Listing|Table|Example|Code|Snippet|Exhibit)\s+\d").unwrap()
});

// === Heuristic patterns ===

/// Matches a `Listing N` header on the first line of a block
pub static LISTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Listing\s+\d+").unwrap());

/// Matches an opening markup tag, capturing its name
pub static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][\w:.-]*)(?:\s[^<>]*)?>").unwrap());

/// Matches a closing markup tag, capturing its name
pub static CLOSE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</([A-Za-z][\w:.-]*)\s*>").unwrap());

/// Matches `if(!` style negated conditionals
pub static IF_NOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"if\s*\(\s*!").unwrap());

/// Matches `while(...)`
pub static WHILE_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"while\s*\([^)]+\)").unwrap());

/// Matches C-style `for(init; cond; step)`
pub static FOR_LOOP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"for\s*\([^)]*;[^)]*;[^)]*\)").unwrap());

/// Matches `switch(...)`
pub static SWITCH_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"switch\s*\([^)]+\)").unwrap());

/// Matches a parenthesized list containing a comma
pub static PAREN_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*,[^)]*\)").unwrap());

/// Matches assignments and comparisons
pub static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\s*[=!<>]=?\s*").unwrap());

/// Matches call-like `name(...)`
pub static CALL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+\s*\([^)]*\)").unwrap());

/// Matches a capitalised sentence ending in terminal punctuation
pub static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z][^.!?]*[.!?](?:\s|$)").unwrap());

/// Matches word-character runs of lowercased text
pub static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9_]+").unwrap());

// === Highlighting patterns ===

/// Matches a callout marker such as `#1` or `#12`
pub static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\d{1,2}\b").unwrap());

/// Constructs that must not be split by code wrapping
pub static NO_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:if|while|for|switch|function|catch)\s*\(|(?:typeof|instanceof|new)\s+\w+|\w+\.\w+|=>\s*\{|\?\s*\.",
    )
    .unwrap()
});
