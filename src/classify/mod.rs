//! Block classifier: folds scanner events into raw lines and category sets.
//!
//! Element nesting is tracked with an explicit stack of [`Frame`]s. Each
//! frame stores the full [`Context`] in effect inside its element, so an end
//! tag restores the outer context exactly, including for malformed nesting
//! such as `<code><pre>..</code></pre>`.

mod context;
mod normalize;

use std::collections::BTreeSet;

pub use context::{Context, Frame, language_from_class};
pub use normalize::{collapse_whitespace, normalize_glyphs};

use crate::config::ClassifierConfig;
use crate::scan::{Attr, ScanEvent, attr};
use crate::util::percent_decode;
use context::{is_block, is_heading, is_void};

/// Whether images are kept as placeholders or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Interactive rendering: images become `[IMG:n]` placeholders.
    #[default]
    Full,
    /// Plain-text extraction: images are skipped.
    Dump,
}

/// One accumulated text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub index: usize,
    pub text: String,
    /// Language hint of the enclosing `<pre>`/`<code>`, if any.
    pub language: Option<String>,
}

/// Per-category membership of raw line indices.
///
/// The sets are not mutually exclusive; a single category is resolved per
/// reflow group later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySets {
    pub heading: BTreeSet<usize>,
    pub caption: BTreeSet<usize>,
    pub indented: BTreeSet<usize>,
    pub bullet: BTreeSet<usize>,
    pub preformatted: BTreeSet<usize>,
    pub code: BTreeSet<usize>,
    pub prose: BTreeSet<usize>,
}

/// An image referenced from a `[IMG:n]` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImageRef {
    pub index: usize,
    /// Source path as written in the markup, percent-decoded.
    pub src: String,
    pub alt: Option<String>,
}

/// Classifier output for one chapter.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedChapter {
    pub lines: Vec<RawLine>,
    pub categories: CategorySets,
    pub images: Vec<ImageRef>,
    pub alt_texts: Vec<String>,
}

impl ClassifiedChapter {
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Format the placeholder for an image index.
pub fn image_placeholder(index: usize) -> String {
    format!("[IMG:{index}]")
}

/// Parse a line that consists only of an image placeholder.
pub fn parse_placeholder(text: &str) -> Option<usize> {
    text.trim()
        .strip_prefix("[IMG:")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

#[derive(Debug)]
struct LinkState {
    href: String,
    emitted: bool,
}

/// Folds scanner events into a [`ClassifiedChapter`].
pub struct Classifier<'a> {
    config: &'a ClassifierConfig,
    mode: Mode,
    root: Context,
    frames: Vec<Frame>,
    links: Vec<LinkState>,
    out: ClassifiedChapter,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a ClassifierConfig, mode: Mode) -> Self {
        Self {
            config,
            mode,
            root: Context::default(),
            frames: Vec::new(),
            links: Vec::new(),
            out: ClassifiedChapter {
                lines: vec![RawLine {
                    index: 0,
                    text: String::new(),
                    language: None,
                }],
                ..Default::default()
            },
        }
    }

    fn ctx(&self) -> &Context {
        self.frames.last().map(|f| &f.ctx).unwrap_or(&self.root)
    }

    fn current_text(&self) -> &str {
        self.out.lines.last().map(|l| l.text.as_str()).unwrap_or("")
    }

    fn current_mut(&mut self) -> &mut RawLine {
        if self.out.lines.is_empty() {
            self.new_line();
        }
        let last = self.out.lines.len() - 1;
        &mut self.out.lines[last]
    }

    fn new_line(&mut self) {
        let index = self.out.lines.len();
        self.out.lines.push(RawLine {
            index,
            text: String::new(),
            language: None,
        });
    }

    /// Append an empty line unless the last line already is one.
    fn separate(&mut self) {
        if !self.current_text().is_empty() {
            self.new_line();
        }
    }

    /// Leave a whole empty line behind, so the next block can never be
    /// joined to the previous one.
    fn hard_separate(&mut self) {
        self.separate();
        let n = self.out.lines.len();
        if n >= 2 && !self.out.lines[n - 2].text.is_empty() {
            self.new_line();
        }
    }

    pub fn feed(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::StartTag { name, attrs } => self.start_tag(name, attrs),
            ScanEvent::EndTag { name } => self.end_tag(name),
            ScanEvent::SelfClosingTag { name, attrs } => {
                self.start_tag(name, attrs);
                if !is_void(name) {
                    self.end_tag(name);
                }
            }
            ScanEvent::Text(text) => self.text(text),
        }
    }

    fn start_tag(&mut self, name: &str, attrs: &[Attr]) {
        if is_void(name) {
            self.void_tag(name, attrs);
            return;
        }

        if name == "li" {
            self.hard_separate();
        } else if is_block(name) {
            self.separate();
        }
        if matches!(name, "td" | "th") && !self.current_text().is_empty() {
            self.current_mut().text.push_str("  ");
        }

        let mut ctx = self.ctx().enter(name, attrs, self.config);
        if name == "a" {
            ctx.link = attr(attrs, "href")
                .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
                .map(|href| {
                    self.links.push(LinkState {
                        href: href.to_string(),
                        emitted: false,
                    });
                    self.links.len() - 1
                });
        }

        let closer = match name {
            "sup" => Some(("[", "]")),
            "sub" => Some(("_{", "}")),
            _ => None,
        };
        if let Some((open, _)) = closer
            && !ctx.hidden
        {
            self.current_mut().text.push_str(open);
        }

        self.frames.push(Frame {
            name: name.to_string(),
            ctx,
            closer: closer.map(|(_, close)| close),
        });
    }

    fn void_tag(&mut self, name: &str, attrs: &[Attr]) {
        match name {
            "br" => self.new_line(),
            "hr" => self.separate(),
            "img" | "image" => {
                if self.mode == Mode::Dump || self.ctx().hidden {
                    return;
                }
                let src = if name == "img" {
                    attr(attrs, "src")
                } else {
                    attrs
                        .iter()
                        .find(|a| a.name.ends_with("href"))
                        .map(|a| a.value.as_str())
                };
                if let Some(src) = src {
                    self.image(src, attr(attrs, "alt"));
                }
            }
            _ => {}
        }
    }

    fn image(&mut self, src: &str, alt: Option<&str>) {
        let index = self.out.images.len();
        self.separate();
        self.current_mut().text = image_placeholder(index);
        self.new_line();

        self.out.images.push(ImageRef {
            index,
            src: percent_decode(src),
            alt: alt.map(str::to_string),
        });
        self.out.alt_texts.push(alt.unwrap_or("").to_string());
    }

    fn end_tag(&mut self, name: &str) {
        let Some(pos) = self.frames.iter().rposition(|f| f.name == name) else {
            if is_block(name) {
                self.separate();
            }
            return;
        };

        while self.frames.len() > pos {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            self.close(&frame);
        }
    }

    fn close(&mut self, frame: &Frame) {
        if let Some(closer) = frame.closer
            && !frame.ctx.hidden
        {
            self.current_mut().text.push_str(closer);
        }

        if is_heading(&frame.name) {
            self.new_line();
            self.new_line();
        } else if is_block(&frame.name) {
            self.separate();
        }
    }

    fn text(&mut self, raw: &str) {
        let ctx = self.ctx().clone();
        if ctx.hidden {
            return;
        }

        let href;
        let mut raw = raw;
        if let Some(link) = ctx.link.and_then(|i| self.links.get_mut(i)) {
            if link.emitted {
                return;
            }
            if !raw.trim().is_empty() {
                link.emitted = true;
                let lead = if raw.starts_with(char::is_whitespace) { " " } else { "" };
                href = format!("{lead}{}", link.href);
                raw = &href;
            }
        }

        let fresh = self.current_text().is_empty();
        let pre = ctx.preformatted;
        let trimmed = match (fresh, pre) {
            (true, true) => normalize::strip_leading_breaks(raw),
            (true, false) => raw.trim_start(),
            (false, _) => raw,
        };
        let cleaned = if pre {
            trimmed.to_string()
        } else {
            collapse_whitespace(trimmed)
        };
        let text = normalize_glyphs(&cleaned);
        if text.is_empty() {
            return;
        }

        let line = self.current_mut();
        line.text.push_str(&text);
        if ctx.language.is_some() {
            line.language = ctx.language.clone();
        }
        let index = line.index;

        if !text.trim().is_empty() {
            self.record(index, &ctx);
        }
    }

    fn record(&mut self, index: usize, ctx: &Context) {
        let sets = &mut self.out.categories;
        if ctx.heading {
            sets.heading.insert(index);
        }
        if ctx.caption {
            sets.caption.insert(index);
        }
        if ctx.indented {
            sets.indented.insert(index);
        }
        if ctx.bullet {
            sets.bullet.insert(index);
        }
        if ctx.preformatted || ctx.code {
            sets.preformatted.insert(index);
        }
        if ctx.code {
            sets.code.insert(index);
            sets.prose.remove(&index);
        } else if ctx.prose_override && !sets.code.contains(&index) {
            sets.prose.insert(index);
        }
    }

    pub fn finish(self) -> ClassifiedChapter {
        self.out
    }
}

/// Classify a scanned chapter.
pub fn classify(events: &[ScanEvent], config: &ClassifierConfig, mode: Mode) -> ClassifiedChapter {
    let mut classifier = Classifier::new(config, mode);
    for event in events {
        classifier.feed(event);
    }
    classifier.finish()
}
