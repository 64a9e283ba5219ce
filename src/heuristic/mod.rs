//! Code/prose heuristic for preformatted blocks without explicit marking.
//!
//! Two additive scores are kept: `code_score` starts at 0 and `prose_score`
//! at 20. A block is code only when the code score beats the prose score by
//! more than [`PROSE_MARGIN`], or when a strong markup signal is present.
//!
//! Irregular line lengths are the strongest code signal; regular paragraph
//! shape (same start column, even line lengths, short last line) is the
//! strongest prose signal.

mod keywords;
mod metrics;

use std::collections::HashMap;

use crate::classify::{CategorySets, RawLine};
use crate::patterns::{
    ASSIGNMENT_RE, CALL_RE, CLOSE_TAG_RE, FOR_LOOP_RE, IF_NOT_RE, LISTING_RE, OPEN_TAG_RE,
    PAREN_COMMA_RE, SENTENCE_RE, SWITCH_PAREN_RE, WHILE_PAREN_RE,
};

pub use keywords::{STRONG_CODE_KEYWORDS, strong_keyword_bonus};

/// Prose favouritism: code needs a lead of more than this.
pub const PROSE_MARGIN: i32 = 15;

/// Initial prose bias.
const PROSE_BASE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BlockKind {
    Code,
    Prose,
}

/// Evidence that forces a code verdict regardless of scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StrongSignal {
    /// First line reads `Listing N`.
    ListingHeader,
    /// Contains an XML declaration.
    XmlDeclaration,
    /// Contains a doctype.
    Doctype,
    /// Number of matched open/close tag pairs (at least two).
    MarkupPairs(usize),
}

/// Result of scoring one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CodeVerdict {
    pub kind: BlockKind,
    pub code_score: i32,
    pub prose_score: i32,
    pub signal: Option<StrongSignal>,
}

impl CodeVerdict {
    /// How far the code score clears the prose threshold; positive means code.
    pub fn margin(&self) -> i32 {
        self.code_score - (self.prose_score + PROSE_MARGIN)
    }

    pub fn is_code(&self) -> bool {
        self.kind == BlockKind::Code
    }
}

/// Count open/close tag pairs with matching names.
fn markup_pairs(text: &str) -> usize {
    let mut tags: Vec<(usize, bool, &str)> = Vec::new();
    for caps in OPEN_TAG_RE.captures_iter(text) {
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
            tags.push((whole.start(), true, name.as_str()));
        }
    }
    for caps in CLOSE_TAG_RE.captures_iter(text) {
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
            tags.push((whole.start(), false, name.as_str()));
        }
    }
    tags.sort_by_key(|t| t.0);

    let mut open: HashMap<&str, usize> = HashMap::new();
    let mut pairs = 0;
    for (_, is_open, name) in tags {
        let count = open.entry(name).or_insert(0);
        if is_open {
            *count += 1;
        } else if *count > 0 {
            *count -= 1;
            pairs += 1;
        }
    }
    pairs
}

fn strong_signal(text: &str) -> Option<StrongSignal> {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if LISTING_RE.is_match(first.trim_start()) {
        return Some(StrongSignal::ListingHeader);
    }
    if text.contains("<?xml") {
        return Some(StrongSignal::XmlDeclaration);
    }
    if text.to_ascii_lowercase().contains("<!doctype") {
        return Some(StrongSignal::Doctype);
    }
    match markup_pairs(text) {
        n if n >= 2 => Some(StrongSignal::MarkupPairs(n)),
        _ => None,
    }
}

fn tiered(count: usize, tiers: &[(usize, i32)]) -> i32 {
    tiers
        .iter()
        .find(|(min, _)| count >= *min)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

fn code_score(text: &str, text_lower: &str, lines: &[&str]) -> i32 {
    let mut score = 0;

    score += strong_keyword_bonus(keywords::distinct_keywords(
        text_lower,
        keywords::STRONG_CODE_KEYWORDS,
    ));
    if keywords::distinct_keywords(text_lower, keywords::WEAK_CODE_KEYWORDS) >= 5 {
        score += 1;
    }

    score += IF_NOT_RE.find_iter(text_lower).count() as i32 * 30;
    score += WHILE_PAREN_RE.find_iter(text_lower).count() as i32 * 25;
    score += FOR_LOOP_RE.find_iter(text_lower).count() as i32 * 35;
    score += SWITCH_PAREN_RE.find_iter(text_lower).count() as i32 * 30;

    let lengths: Vec<usize> = lines.iter().map(|l| l.trim().chars().count()).collect();
    score += metrics::variation_bonus(&lengths);
    score += metrics::indent_consistency_bonus(lines);

    let total_chars = text.chars().count();
    let open = text.matches('{').count();
    let close = text.matches('}').count();
    let braces = open + close;
    if braces > 0 {
        score += braces as i32 * 12;
        if open == close {
            score += 40;
        }
        let density = braces as f64 / total_chars as f64;
        score += match density {
            d if d > 0.05 => 30,
            d if d > 0.03 => 20,
            d if d > 0.01 => 10,
            _ => 0,
        };
    }

    score += tiered(PAREN_COMMA_RE.find_iter(text).count(), &[(3, 8), (2, 5), (1, 3)]);

    if total_chars > 0 {
        let other = text.matches(';').count() + text.matches(['[', ']']).count();
        score += match other as f64 / total_chars as f64 {
            d if d > 0.05 => 3,
            d if d > 0.02 => 1,
            _ => 0,
        };
    }

    score += tiered(ASSIGNMENT_RE.find_iter(text).count(), &[(3, 2), (1, 1)]);
    score += tiered(CALL_RE.find_iter(text).count(), &[(3, 2), (1, 1)]);

    score
}

fn prose_score(text: &str, text_lower: &str, lines: &[&str]) -> i32 {
    let mut score = PROSE_BASE;

    let endings = text.matches(['.', '!', '?']).count();
    score += match endings as f64 / lines.len() as f64 {
        r if r > 0.8 => 5,
        r if r > 0.4 => 3,
        _ => 0,
    };

    score += tiered(
        SENTENCE_RE.find_iter(text).count(),
        &[(6, 150), (4, 120), (3, 100), (2, 80), (1, 60)],
    );

    let words = keywords::words(text_lower);
    if !words.is_empty() {
        let total = words.len() as f64;
        let strong = words
            .iter()
            .filter(|w| keywords::STRONG_PROSE_WORDS.contains(w))
            .count();
        let ambiguous = words
            .iter()
            .filter(|w| keywords::AMBIGUOUS_WORDS.contains(w))
            .count();
        score += keywords::strong_prose_bonus(strong as f64 / total);
        score += keywords::ambiguous_bonus(ambiguous as f64 / total);
    }

    if lines.len() > 1 {
        let lengths: Vec<usize> = lines.iter().map(|l| l.trim().chars().count()).collect();
        score += metrics::consistent_start_bonus(lines);
        score += metrics::regular_length_bonus(&lengths);
    }

    let avg_len = lines.iter().map(|l| l.chars().count()).sum::<usize>() as f64 / lines.len() as f64;
    score += match avg_len {
        a if a > 80.0 => 3,
        a if a > 60.0 => 1,
        _ => 0,
    };

    score
}

/// Score a block and decide whether it is code.
pub fn classify_block(text: &str) -> CodeVerdict {
    let lines: Vec<&str> = text
        .split('\n')
        .filter(|l| !l.trim().is_empty())
        .map(str::trim_end)
        .collect();

    if lines.is_empty() {
        return CodeVerdict {
            kind: BlockKind::Prose,
            code_score: 0,
            prose_score: PROSE_BASE,
            signal: None,
        };
    }

    let text_lower = text.to_lowercase();
    let signal = strong_signal(text);
    let code_score = code_score(text, &text_lower, &lines);
    let prose_score = prose_score(text, &text_lower, &lines);

    let mut verdict = CodeVerdict {
        kind: BlockKind::Prose,
        code_score,
        prose_score,
        signal,
    };
    if signal.is_some() || verdict.margin() > 0 {
        verdict.kind = BlockKind::Code;
    }
    verdict
}

/// Whether a block looks like code.
pub fn looks_like_code(text: &str) -> bool {
    classify_block(text).is_code()
}

/// Offsets checked for confirmed code around a line.
const NEIGHBOUR_OFFSETS: [isize; 4] = [-2, -1, 1, 2];

/// Count confirmed-code lines within two lines of `index`.
fn code_neighbours(lines: &[RawLine], index: usize, confirmed: &CategorySets) -> usize {
    let is_confirmed = |i: usize| confirmed.code.contains(&i) || confirmed.preformatted.contains(&i);

    NEIGHBOUR_OFFSETS
        .iter()
        .filter(|&&offset| {
            let Some(target) = index.checked_add_signed(offset) else {
                return false;
            };
            target < lines.len() && is_confirmed(target)
        })
        .count()
}

/// Pull unmarked lines sitting inside code listings into the code set.
///
/// A line with two confirmed neighbours becomes code; a line with one
/// neighbour becomes code when it also scores as code on its own.
pub fn coalesce(lines: &[RawLine], categories: &mut CategorySets) {
    let confirmed = categories.clone();

    for line in lines {
        let i = line.index;
        if line.text.trim().is_empty() || confirmed.code.contains(&i) || confirmed.prose.contains(&i)
        {
            continue;
        }

        let neighbours = code_neighbours(lines, i, &confirmed);
        if neighbours >= 2 || (neighbours == 1 && looks_like_code(&line.text)) {
            log::trace!("coalescing line {i} into adjacent code ({neighbours} neighbours)");
            categories.code.insert(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prose_paragraph_is_not_code() {
        let text = "This is clearly just a long explanatory paragraph written in plain English \
                    sentences that happen to be preformatted for layout reasons only.";
        let verdict = classify_block(text);
        assert_eq!(verdict.kind, BlockKind::Prose);
        assert!(verdict.margin() <= 0);
    }

    #[test]
    fn test_c_function_is_code() {
        let text = "int main(int argc, char **argv) {\n    for (i = 0; i < n; i++) {\n        if (!ok) return 1;\n    }\n    return 0;\n}";
        assert!(looks_like_code(text));
    }

    #[test]
    fn test_sql_is_code() {
        let text = "SELECT name, total\nFROM orders o\nINNER JOIN users u ON u.id = o.user_id\nWHERE total > 10\nORDER BY total\nLIMIT 5";
        let verdict = classify_block(text);
        assert!(verdict.is_code(), "{verdict:?}");
    }

    #[test]
    fn test_listing_header_forces_code() {
        let verdict = classify_block("Listing 3 A plain sentence follows here.");
        assert_eq!(verdict.signal, Some(StrongSignal::ListingHeader));
        assert!(verdict.is_code());
    }

    #[test]
    fn test_markup_pairs_force_code() {
        let verdict = classify_block("<book>\n  <title>Dune</title>\n</book>");
        assert_eq!(verdict.signal, Some(StrongSignal::MarkupPairs(2)));
        assert!(verdict.is_code());
    }

    #[test]
    fn test_single_tag_pair_is_not_signal() {
        assert_eq!(markup_pairs("use <b>bold</b> here"), 1);
        assert_eq!(strong_signal("use <b>bold</b> here"), None);
    }

    #[test]
    fn test_empty_block() {
        let verdict = classify_block("  \n ");
        assert_eq!(verdict.kind, BlockKind::Prose);
        assert_eq!(verdict.prose_score, 20);
    }

    fn raw(texts: &[&str]) -> Vec<RawLine> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| RawLine {
                index,
                text: t.to_string(),
                language: None,
            })
            .collect()
    }

    #[test]
    fn test_coalesce_sandwiched_line() {
        let lines = raw(&["x = 1", "total", "y = 2"]);
        let mut sets = CategorySets::default();
        sets.code.insert(0);
        sets.code.insert(2);
        coalesce(&lines, &mut sets);
        assert!(sets.code.contains(&1));
    }

    #[test]
    fn test_coalesce_reaches_across_separators() {
        let lines = raw(&["fn a() {}", "", "x = foo(a, b);", "", "fn b() {}"]);
        let mut sets = CategorySets::default();
        sets.code.insert(0);
        sets.code.insert(4);
        coalesce(&lines, &mut sets);
        assert!(sets.code.contains(&2));
        assert!(!sets.code.contains(&1));
        assert!(!sets.code.contains(&3));
    }

    #[test]
    fn test_coalesce_single_distant_neighbour_needs_code_verdict() {
        let lines = raw(&["fn main() {}", "", "Some ordinary prose sits here."]);
        let mut sets = CategorySets::default();
        sets.code.insert(0);
        coalesce(&lines, &mut sets);
        assert!(!sets.code.contains(&2));
    }

    #[test]
    fn test_coalesce_skips_prose_marked() {
        let lines = raw(&["a()", "b", "c()"]);
        let mut sets = CategorySets::default();
        sets.code.insert(0);
        sets.code.insert(2);
        sets.prose.insert(1);
        coalesce(&lines, &mut sets);
        assert!(!sets.code.contains(&1));
    }

    const SIX_LETTER_KEYWORDS: &[&str] = &[
        "import", "export", "public", "static", "delete", "select", "update", "insert", "create",
        "return", "unwind", "struct", "typeof",
    ];

    proptest! {
        #[test]
        fn prop_strong_keywords_never_lower_code_score(
            fillers in prop::collection::vec("qx[a-z]{4}", 6..20),
            swaps in prop::collection::vec(0usize..13, 0..13),
            width in 2usize..6,
        ) {
            let render = |words: &[String]| {
                words
                    .chunks(width)
                    .map(|c| c.join(" "))
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            let mut words = fillers.clone();
            let mut last = classify_block(&render(&words)).code_score;
            for (slot, kw) in swaps.iter().enumerate() {
                if slot >= words.len() {
                    break;
                }
                words[slot] = SIX_LETTER_KEYWORDS[*kw].to_string();
                let score = classify_block(&render(&words)).code_score;
                prop_assert!(score >= last, "{} < {}", score, last);
                last = score;
            }
        }
    }
}
