//! Turning categorized groups into terminal lines.
//!
//! Every function appends to an output vector and finishes its block with
//! [`end_block`], so consecutive blocks are separated by exactly one blank
//! line whatever their category.

mod code_wrap;
mod table;
mod wrap;

use unicode_width::UnicodeWidthStr;

use crate::highlight::Highlighted;
use crate::patterns::URL_RE;
use crate::reflow::Category;
use crate::render::RenderLine;

pub use code_wrap::smart_code_wrap;
pub use table::is_table_row;
pub use wrap::{is_url_word, wrap};

/// Prefix of quote lines and of bullet continuation lines.
const INDENT: &str = "   ";

/// Prefix of the first line of a bullet item.
const BULLET: &str = " - ";

fn is_blank(line: &RenderLine) -> bool {
    matches!(line, RenderLine::PlainText(text) if text.is_empty())
}

/// Close a block with one blank line, never doubling.
pub fn end_block(out: &mut Vec<RenderLine>) {
    if out.last().is_some_and(|l| !is_blank(l)) {
        out.push(RenderLine::PlainText(String::new()));
    }
}

/// Open a block that wants a blank line before it.
fn start_block(out: &mut Vec<RenderLine>) {
    end_block(out);
}

/// Left-pad `text` so it sits in the middle of `width` columns.
pub fn center(text: &str, width: usize) -> String {
    let w = text.width();
    let pad = (width / 2 + w / 2).saturating_sub(w);
    format!("{}{text}", " ".repeat(pad))
}

/// Lines carrying a URL are tagged so the pager can highlight them.
fn url_or(text: String, line: fn(String) -> RenderLine) -> RenderLine {
    if URL_RE.is_match(&text) {
        RenderLine::UrlHighlighted(text)
    } else {
        line(text)
    }
}

fn prefixed(
    text: &str,
    width: usize,
    first: &str,
    line: fn(String) -> RenderLine,
    out: &mut Vec<RenderLine>,
) {
    let lines = wrap(text, width.saturating_sub(INDENT.len()));
    for (i, wrapped) in lines.into_iter().enumerate() {
        let prefix = if i == 0 { first } else { INDENT };
        out.push(url_or(format!("{prefix}{wrapped}"), line));
    }
}

/// Lay out a group whose category needs no code decision.
///
/// Preformatted groups here are rendered verbatim as prose; code goes
/// through [`layout_code`].
pub fn layout_text(category: Category, text: &str, width: usize, out: &mut Vec<RenderLine>) {
    if text.trim().is_empty() {
        return;
    }

    match category {
        Category::Heading => {
            for line in wrap(text, width) {
                out.push(RenderLine::Header(center(&line, width)));
            }
        }
        Category::Caption => {
            start_block(out);
            for line in wrap(text, width) {
                out.push(RenderLine::Caption(line));
            }
        }
        Category::Quote => prefixed(text, width, INDENT, RenderLine::Quote, out),
        Category::Bullet => prefixed(text, width, BULLET, RenderLine::BulletItem, out),
        Category::Preformatted(_) => layout_preformatted(text, out),
        Category::Prose if is_table_row(text) => {
            if text.width() <= width {
                out.push(RenderLine::TableRow(text.to_string()));
            } else {
                out.extend(wrap(text, width).into_iter().map(RenderLine::TableRow));
            }
        }
        Category::Prose => {
            out.extend(
                wrap(text, width)
                    .into_iter()
                    .map(|line| url_or(line, RenderLine::PlainText)),
            );
        }
    }
    end_block(out);
}

fn layout_preformatted(text: &str, out: &mut Vec<RenderLine>) {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    for line in lines {
        out.push(RenderLine::PlainText(format!("{INDENT}{line}")));
    }
}

/// Lay out a highlighted code block, framed by blank lines.
///
/// Lines are kept whole unless `wrap_code` is set, in which case long lines
/// are broken with [`smart_code_wrap`].
pub fn layout_code(code: &Highlighted, width: usize, wrap_code: bool, out: &mut Vec<RenderLine>) {
    if code.lines.is_empty() {
        return;
    }

    start_block(out);
    for line in &code.lines {
        if wrap_code && line.text.chars().count() > width {
            for (text, colors) in smart_code_wrap(&line.text, &line.colors, width) {
                out.push(RenderLine::CodeLine { text, colors });
            }
        } else {
            out.push(RenderLine::CodeLine {
                text: line.text.clone(),
                colors: line.colors.clone(),
            });
        }
    }
    end_block(out);
}

/// Plain-text rendering of one group for dumps.
///
/// No colours or centring; preformatted text is kept verbatim.
pub fn layout_plain(category: Category, text: &str, width: usize, out: &mut Vec<String>) {
    if text.trim().is_empty() {
        return;
    }

    match category {
        Category::Preformatted(_) => {
            let trimmed = text.trim_end_matches(['\n', '\r']);
            out.extend(trimmed.split('\n').map(str::to_string));
        }
        Category::Bullet => {
            for (i, line) in wrap(text, width.saturating_sub(2)).into_iter().enumerate() {
                let prefix = if i == 0 { "- " } else { "  " };
                out.push(format!("{prefix}{line}"));
            }
        }
        Category::Quote => {
            out.extend(
                wrap(text, width.saturating_sub(INDENT.len()))
                    .into_iter()
                    .map(|line| format!("{INDENT}{line}")),
            );
        }
        Category::Heading | Category::Caption | Category::Prose => out.extend(wrap(text, width)),
    }
    out.push(String::new());
}
