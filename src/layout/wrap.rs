//! Greedy word wrapping on display width.
//!
//! URLs are never broken: a URL that would take most of a line gets a line
//! of its own so it stays selectable in a terminal.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// A URL word wider than this share of the line goes on its own line.
const URL_OWN_LINE_RATIO: f64 = 0.8;

pub fn is_url_word(word: &str) -> bool {
    word.contains("http://") || word.contains("https://")
}

/// Split a word into pieces no wider than `width` columns.
fn split_word(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_width = 0;

    for ch in word.chars() {
        let w = ch.width().unwrap_or(0);
        if piece_width + w > width && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            piece_width = 0;
        }
        piece.push(ch);
        piece_width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

struct LineBuilder {
    width: usize,
    lines: Vec<String>,
    current: String,
    current_width: usize,
}

impl LineBuilder {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: String::new(),
            current_width: 0,
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
            self.current_width = 0;
        }
    }

    fn fits(&self, word_width: usize) -> bool {
        if self.current.is_empty() {
            word_width <= self.width
        } else {
            self.current_width + 1 + word_width <= self.width
        }
    }

    fn push_word(&mut self, word: &str, word_width: usize) {
        if !self.current.is_empty() {
            self.current.push(' ');
            self.current_width += 1;
        }
        self.current.push_str(word);
        self.current_width += word_width;
    }

    fn place(&mut self, word: &str, word_width: usize) {
        if !self.fits(word_width) {
            self.flush();
        }
        self.push_word(word, word_width);
    }
}

/// Wrap `text` to lines no wider than `width` columns.
///
/// Whitespace runs between words collapse to one space. URL words may
/// exceed `width`; everything else is split to fit.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut builder = LineBuilder::new(width);

    for word in text.split_whitespace() {
        let word_width = word.width();

        if is_url_word(word) {
            if word_width as f64 > width as f64 * URL_OWN_LINE_RATIO {
                builder.flush();
                builder.lines.push(word.to_string());
            } else {
                builder.place(word, word_width);
            }
        } else if word_width > width {
            for piece in split_word(word, width) {
                let piece_width = piece.width();
                builder.place(&piece, piece_width);
            }
        } else {
            builder.place(word, word_width);
        }
    }

    builder.flush();
    builder.lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_greedy_wrap() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_long_url_on_own_line() {
        let url = "https://example.com/a/very/long/path/that/goes/on";
        let lines = wrap(&format!("see {url} for details"), 40);
        assert_eq!(lines, vec!["see", url, "for details"]);
    }

    #[test]
    fn test_short_url_placed_as_word() {
        let lines = wrap("read https://a.io/x now", 40);
        assert_eq!(lines, vec!["read https://a.io/x now"]);
    }

    #[test]
    fn test_long_word_split() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wide_chars_measured_by_columns() {
        // Each ideograph takes two columns
        assert_eq!(wrap("漢字 漢字", 4), vec!["漢字", "漢字"]);
    }

    proptest! {
        #[test]
        fn prop_urls_never_split(
            words in proptest::collection::vec("[a-z]{1,12}", 0..20),
            path in "[a-z0-9/]{0,60}",
            pos in 0usize..20,
            width in 20usize..120,
        ) {
            let url = format!("https://example.com/{path}");
            let mut words = words;
            let at = pos.min(words.len());
            words.insert(at, url.clone());
            let text = words.join(" ");

            let lines = wrap(&text, width);
            prop_assert!(lines.iter().any(|l| l.split(' ').any(|w| w == url)));
            for line in &lines {
                prop_assert!(line.width() <= width || line.contains(&url));
            }
        }
    }
}
