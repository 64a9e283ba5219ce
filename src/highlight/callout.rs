//! Callout alignment for annotated code listings.
//!
//! Listings in technical books carry markers such as `#1` that refer to
//! explanations below the listing. They are moved out of the code and lined
//! up in one column.

use std::borrow::Cow;

use unicode_width::UnicodeWidthStr;

use crate::patterns::CALLOUT_RE;

/// Minimum column at which callouts are placed.
const MIN_CALLOUT_COLUMN: usize = 60;

/// Gap between the longest code line and the callout column.
const CALLOUT_GAP: usize = 4;

/// Append `piece` to `out`, separating words with a single space.
fn append_piece(out: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if !out.trim().is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(piece);
}

/// Split a line into its code (callouts removed) and its callouts.
fn split_callouts(line: &str) -> (String, Vec<&str>) {
    let mut clean = String::with_capacity(line.len());
    let mut callouts = Vec::new();
    let mut last = 0;

    for m in CALLOUT_RE.find_iter(line) {
        if m.start() < last {
            continue;
        }
        let before = &line[last..m.start()];
        if clean.trim().is_empty() && before.trim().is_empty() {
            // Indentation ahead of a leading callout
            clean.push_str(before);
        } else {
            append_piece(&mut clean, before.trim_end());
        }
        callouts.push(m.as_str());

        let rest = &line[m.end()..];
        last = m.end() + (rest.len() - rest.trim_start().len());
    }
    append_piece(&mut clean, &line[last..]);

    (clean, callouts)
}

/// Move callout markers to an aligned column.
///
/// Text without callouts is returned unchanged.
pub fn reorganize_callouts(text: &str) -> Cow<'_, str> {
    if !CALLOUT_RE.is_match(text) {
        return Cow::Borrowed(text);
    }

    let split: Vec<(String, Vec<&str>)> = text.split('\n').map(split_callouts).collect();
    let longest = split
        .iter()
        .map(|(clean, _)| clean.trim_end().width())
        .max()
        .unwrap_or(0);
    let column = MIN_CALLOUT_COLUMN.max(longest + CALLOUT_GAP);

    let lines: Vec<String> = split
        .into_iter()
        .map(|(clean, callouts)| {
            if callouts.is_empty() {
                return clean;
            }
            let code = clean.trim_end();
            let pad = column.saturating_sub(code.width());
            format!("{code}{}{}", " ".repeat(pad), callouts.join(" "))
        })
        .collect();

    Cow::Owned(lines.join("\n"))
}
