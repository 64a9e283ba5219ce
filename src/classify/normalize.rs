//! Glyph and whitespace normalisation for classified text.

use std::borrow::Cow;

/// Map a circled numeral to its callout number.
fn circled_number(c: char) -> Option<u32> {
    let c = c as u32;
    match c {
        // ① .. ⑳
        0x2460..=0x2473 => Some(c - 0x2460 + 1),
        // ➀ .. ➉ (sans-serif), ❶ .. ❿, ➊ .. ➓
        0x2780..=0x2789 => Some(c - 0x2780 + 1),
        0x2776..=0x277F => Some(c - 0x2776 + 1),
        0x278A..=0x2793 => Some(c - 0x278A + 1),
        _ => None,
    }
}

fn square_bullet(c: char) -> Option<char> {
    match c {
        '■' | '▪' | '◾' => Some('•'),
        '▫' | '◽' => Some('◦'),
        _ => None,
    }
}

/// Rewrite circled numerals to `#N` callouts and square bullets to round ones.
pub fn normalize_glyphs(text: &str) -> Cow<'_, str> {
    if !text
        .chars()
        .any(|c| circled_number(c).is_some() || square_bullet(c).is_some())
    {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if let Some(n) = circled_number(c) {
            out.push('#');
            out.push_str(&n.to_string());
        } else if let Some(b) = square_bullet(c) {
            out.push(b);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Strip line breaks (but not indentation) from the start of preformatted text.
pub fn strip_leading_breaks(text: &str) -> &str {
    text.trim_start_matches(['\n', '\r'])
}
