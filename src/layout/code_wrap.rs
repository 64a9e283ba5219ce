//! Wrapping of long code lines at syntactically safe points.

use crate::highlight::DualColor;
use crate::patterns::NO_BREAK_RE;

/// Characters a code line may be broken after.
const GOOD_BREAK_CHARS: &[char] = &[';', ',', '{', '}', ')', '|', '&'];

/// How far around a candidate break protected constructs are searched.
const NO_BREAK_WINDOW: usize = 20;

/// Whether breaking after `chars[i]` would split a protected construct.
fn splits_protected(chars: &[char], i: usize) -> bool {
    let lo = i.saturating_sub(NO_BREAK_WINDOW);
    let hi = (i + NO_BREAK_WINDOW).min(chars.len());
    let window: String = chars[lo..hi].iter().collect();
    let at = i - lo;

    NO_BREAK_RE.find_iter(&window).any(|m| {
        let start = window[..m.start()].chars().count();
        let end = start + m.as_str().chars().count();
        start < at && at < end
    })
}

/// Latest break index at a good break character, searching the right half.
fn preferred_break(chars: &[char], width: usize) -> Option<usize> {
    let last = width.min(chars.len()).checked_sub(1)?;
    (width / 2 + 1..=last)
        .rev()
        .find(|&i| GOOD_BREAK_CHARS.contains(&chars[i]) && !splits_protected(chars, i))
}

/// Latest index in the right half outside quotes and parentheses.
fn fallback_break(chars: &[char], width: usize) -> usize {
    let mut best = width - 1;
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for i in 0..width.min(chars.len()) {
        let ch = chars[i];
        match quote {
            Some(q) => {
                if ch == q && (i == 0 || chars[i - 1] != '\\') {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '(' => depth += 1,
            None if ch == ')' => depth -= 1,
            None => {}
        }
        if depth == 0 && quote.is_none() && i > width / 2 {
            best = i;
        }
    }
    best
}

/// Break a highlighted code line into pieces no longer than `width` chars.
///
/// Breaks go after `; , { } ) | &` unless that would split a call, member
/// access or similar construct; otherwise outside quotes and parentheses.
/// Colours are sliced along with the text.
pub fn smart_code_wrap(text: &str, colors: &[DualColor], width: usize) -> Vec<(String, Vec<DualColor>)> {
    let owned: Vec<char> = text.chars().collect();
    let mut chars = &owned[..];
    let mut colors = colors;
    if width == 0 || chars.len() <= width || colors.len() != chars.len() {
        return vec![(text.to_string(), colors.to_vec())];
    }

    let mut pieces = Vec::new();
    while chars.len() > width {
        let split = preferred_break(chars, width)
            .unwrap_or_else(|| fallback_break(chars, width))
            + 1;

        let mut end = split;
        while end > 0 && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        pieces.push((chars[..end].iter().collect(), colors[..end].to_vec()));

        let mut start = split;
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
        chars = &chars[start..];
        colors = &colors[start..];
    }

    if chars.iter().any(|c| !c.is_whitespace()) {
        pieces.push((chars.iter().collect(), colors.to_vec()));
    }
    pieces
}
