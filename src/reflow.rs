//! Paragraph reflow: joins raw lines that continue one paragraph.
//!
//! Books often hard-wrap paragraphs or split them across inline elements.
//! Adjacent raw lines are merged only when every continuation rule holds,
//! so merged groups never mix categories.

use crate::classify::{CategorySets, RawLine, parse_placeholder};
use crate::patterns::{CAPTION_PREFIX_RE, CODE_KEYWORD_RE, FOOTNOTE_RE, STRUCTURAL_MARKER_RE};

/// Words after which a capitalised continuation is still mid-sentence.
const JOINING_WORDS: &[&str] = &[
    "and", "or", "but", "the", "a", "an", "of", "in", "on", "at", "to", "for", "with",
];

/// One logical paragraph built from contiguous raw lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflowGroup {
    pub text: String,
    /// Raw line indices, ascending and contiguous.
    pub members: Vec<usize>,
}

/// How a preformatted group is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PreKind {
    /// Explicitly marked as code.
    Code,
    /// Explicitly marked as prose by class.
    ProseOverride,
    /// Left to the code/prose heuristic.
    Undecided,
}

/// The single category resolved for a group, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Category {
    Heading,
    Caption,
    Quote,
    Bullet,
    Preformatted(PreKind),
    Prose,
}

fn leading_whitespace(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

fn member_of(set: &std::collections::BTreeSet<usize>, a: usize, b: usize) -> (bool, bool) {
    (set.contains(&a), set.contains(&b))
}

/// Whether `next` continues the paragraph of `current`.
pub fn is_continuation(current: &RawLine, next: &RawLine, categories: &CategorySets) -> bool {
    let (a, b) = (current.index, next.index);

    // Code, headings and captions never merge
    for set in [&categories.code, &categories.heading, &categories.caption] {
        if set.contains(&a) || set.contains(&b) {
            return false;
        }
    }

    for set in [&categories.bullet, &categories.prose] {
        let (x, y) = member_of(set, a, b);
        if x != y {
            return false;
        }
    }

    let cur = current.text.trim();
    let nxt = next.text.trim();
    if cur.is_empty() || nxt.is_empty() {
        return false;
    }
    if parse_placeholder(cur).is_some() || parse_placeholder(nxt).is_some() {
        return false;
    }

    if cur.ends_with(['.', '!', '?', ':', ';']) {
        return false;
    }

    if STRUCTURAL_MARKER_RE.is_match(nxt) || CAPTION_PREFIX_RE.is_match(nxt) {
        return false;
    }

    if nxt.chars().next().is_some_and(char::is_uppercase) {
        let joined = cur.ends_with(',')
            || cur
                .split_whitespace()
                .last()
                .is_some_and(|w| JOINING_WORDS.contains(&w));
        if !joined {
            return false;
        }
    }

    if leading_whitespace(&current.text).abs_diff(leading_whitespace(&next.text)) > 2 {
        return false;
    }

    if CODE_KEYWORD_RE.is_match(&current.text) || CODE_KEYWORD_RE.is_match(&next.text) {
        return false;
    }

    !(FOOTNOTE_RE.is_match(cur) || FOOTNOTE_RE.is_match(nxt))
}

/// Merge continuation lines into groups.
///
/// Each raw line lands in exactly one group, in order.
pub fn reflow(lines: &[RawLine], categories: &CategorySets) -> Vec<ReflowGroup> {
    let mut groups = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let mut text = lines[i].text.clone();
        let mut members = vec![lines[i].index];

        let mut j = i + 1;
        while j < lines.len() && is_continuation(&lines[j - 1], &lines[j], categories) {
            text.push(' ');
            text.push_str(lines[j].text.trim());
            members.push(lines[j].index);
            j += 1;
        }

        groups.push(ReflowGroup { text, members });
        i = j;
    }

    groups
}

/// Resolve the category of a group from its members' memberships.
pub fn resolve_category(group: &ReflowGroup, categories: &CategorySets) -> Category {
    let any = |set: &std::collections::BTreeSet<usize>| group.members.iter().any(|m| set.contains(m));

    if any(&categories.heading) {
        Category::Heading
    } else if any(&categories.caption) {
        Category::Caption
    } else if any(&categories.indented) {
        Category::Quote
    } else if any(&categories.bullet) {
        Category::Bullet
    } else if any(&categories.preformatted) || any(&categories.code) {
        if any(&categories.code) {
            Category::Preformatted(PreKind::Code)
        } else if any(&categories.prose) {
            Category::Preformatted(PreKind::ProseOverride)
        } else {
            Category::Preformatted(PreKind::Undecided)
        }
    } else {
        Category::Prose
    }
}
