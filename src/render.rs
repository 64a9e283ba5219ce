//! The chapter rendering pipeline.
//!
//! ```text
//! bytes ─ decode ─ scan ─ classify ─ coalesce ─ reflow ─┬─ highlight ─┐
//!                                                       └─ wrap ──────┴─ images ─ RenderedChapter
//! ```
//!
//! Rendering never fails. Problems met on the way (tag soup, unknown
//! languages, broken images, a full colour table) are collected as
//! [`Degradation`]s next to the output.
//!
//! ```
//! use termbook::render::{RenderLine, render_chapter};
//!
//! let chapter = render_chapter(b"<h1>Title</h1><p>Hello world.</p>", 80);
//! assert_eq!(chapter.lines[2], RenderLine::PlainText("Hello world.".to_string()));
//! ```

use std::collections::HashSet;

use unicode_width::UnicodeWidthStr;

use crate::classify::{self, ClassifiedChapter, ImageRef, Mode, parse_placeholder};
use crate::config::RenderConfig;
use crate::error::Degradation;
use crate::heuristic::{coalesce, looks_like_code};
use crate::highlight::{DualColor, Highlighted, Highlighter, Rgb};
use crate::image::{ColorPalette, ImageOutcome, ImageRenderer};
use crate::layout::{end_block, layout_code, layout_plain, layout_text};
use crate::reflow::{Category, PreKind, ReflowGroup, reflow, resolve_category};
use crate::scan::{decode_chapter, scan};
use crate::source::ChapterSource;

/// Columns kept free around an image.
const IMAGE_MARGIN: usize = 12;

/// One line of terminal output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RenderLine {
    PlainText(String),
    Header(String),
    Caption(String),
    BulletItem(String),
    Quote(String),
    /// Code with one colour per `char`.
    CodeLine { text: String, colors: Vec<DualColor> },
    /// Image cells with a foreground/background pair per `char`.
    ImageRow { text: String, colors: Vec<(Rgb, Rgb)> },
    TableRow(String),
    UrlHighlighted(String),
}

impl RenderLine {
    pub fn text(&self) -> &str {
        match self {
            RenderLine::PlainText(text)
            | RenderLine::Header(text)
            | RenderLine::Caption(text)
            | RenderLine::BulletItem(text)
            | RenderLine::Quote(text)
            | RenderLine::TableRow(text)
            | RenderLine::UrlHighlighted(text) => text,
            RenderLine::CodeLine { text, .. } | RenderLine::ImageRow { text, .. } => text,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RenderLine::PlainText(text) if text.is_empty())
    }
}

/// Everything produced for one chapter.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderedChapter {
    pub lines: Vec<RenderLine>,
    pub images: Vec<ImageRef>,
    pub alt_texts: Vec<String>,
    pub degradations: Vec<Degradation>,
}

impl RenderedChapter {
    fn degrade(&mut self, degradation: Degradation) {
        log::debug!("{degradation}");
        self.degradations.push(degradation);
    }
}

/// Centre `text` in `width` columns, as images are.
fn center_block(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.width()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

/// Chapter classified and grouped, ready for layout.
struct Prepared {
    chapter: ClassifiedChapter,
    groups: Vec<(ReflowGroup, Category)>,
    degradations: Vec<Degradation>,
}

/// Renders chapters with a fixed configuration.
///
/// # Example
///
/// ```
/// use termbook::config::{ClassifierConfig, RenderConfig};
/// use termbook::render::ChapterRenderer;
///
/// let config = RenderConfig::default()
///     .with_classifier(ClassifierConfig::default().with_prose_class_marker(None));
/// let renderer = ChapterRenderer::with_config(config);
/// let lines = renderer.render_plain(b"<ul><li>one</li><li>two</li></ul>", 40);
/// assert_eq!(lines, vec!["- one", "", "- two", ""]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChapterRenderer {
    config: RenderConfig,
    highlighter: Highlighter,
    images: ImageRenderer,
}

impl ChapterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            images: ImageRenderer::with_config(config.image.clone()),
            highlighter: Highlighter::new(),
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn prepare(&self, bytes: &[u8], mode: Mode) -> Prepared {
        let text = decode_chapter(bytes);
        let scanned = scan(&text);

        let mut degradations = Vec::new();
        if let Some(first) = scanned.errors.first() {
            degradations.push(Degradation::MalformedMarkup {
                count: scanned.errors.len(),
                first: first.clone(),
            });
        }

        let mut chapter = classify::classify(&scanned.events, &self.config.classifier, mode);
        coalesce(&chapter.lines, &mut chapter.categories);

        let groups = reflow(&chapter.lines, &chapter.categories)
            .into_iter()
            .map(|group| {
                let category = resolve_category(&group, &chapter.categories);
                (group, category)
            })
            .collect();

        Prepared {
            chapter,
            groups,
            degradations,
        }
    }

    /// Language hint of the first member that has one.
    fn language_hint<'a>(chapter: &'a ClassifiedChapter, group: &ReflowGroup) -> Option<&'a str> {
        group
            .members
            .iter()
            .find_map(|&i| chapter.lines.get(i).and_then(|l| l.language.as_deref()))
    }

    fn is_code(kind: PreKind, text: &str) -> bool {
        match kind {
            PreKind::Code => true,
            PreKind::ProseOverride => false,
            PreKind::Undecided => looks_like_code(text),
        }
    }

    /// Request a syntax pair for every distinct colour of a code block.
    fn allocate_code_pairs(&self, code: &Highlighted, palette: &mut ColorPalette) {
        let colors: HashSet<DualColor> = code
            .lines
            .iter()
            .flat_map(|line| line.colors.iter().copied())
            .collect();
        for color in colors {
            palette.syntax_pair(color, self.config.theme);
        }
    }

    /// Render with a callback for image placeholders.
    ///
    /// With a palette, code colours and images draw on the same pair budget
    /// and exhaustion is reported once per chapter.
    fn render_inner(
        &self,
        bytes: &[u8],
        width: usize,
        mut palette: Option<&mut ColorPalette>,
        mut on_image: impl FnMut(&ImageRef, &mut RenderedChapter, Option<&mut ColorPalette>),
    ) -> RenderedChapter {
        let width = RenderConfig::effective_width(width);
        let Prepared {
            chapter,
            groups,
            degradations,
        } = self.prepare(bytes, Mode::Full);

        let mut out = RenderedChapter {
            images: chapter.images.clone(),
            alt_texts: chapter.alt_texts.clone(),
            ..Default::default()
        };
        for degradation in degradations {
            out.degrade(degradation);
        }

        let degraded_before = palette.as_deref().map(ColorPalette::degraded_count);
        let mut budget_reported = false;

        for (group, category) in &groups {
            let image = parse_placeholder(group.text.trim()).and_then(|i| chapter.images.get(i));
            if let Some(image) = image {
                on_image(image, &mut out, palette.as_deref_mut());
                end_block(&mut out.lines);
            } else {
                match *category {
                    Category::Preformatted(kind) if Self::is_code(kind, &group.text) => {
                        let hint = Self::language_hint(&chapter, group);
                        let highlighted = self.highlighter.highlight(&group.text, hint);
                        if let Some(degradation) = highlighted.degradation.clone() {
                            out.degrade(degradation);
                        }
                        if let Some(palette) = palette.as_deref_mut() {
                            self.allocate_code_pairs(&highlighted, palette);
                        }
                        layout_code(&highlighted, width, self.config.wrap_code, &mut out.lines);
                    }
                    category => layout_text(category, &group.text, width, &mut out.lines),
                }
            }

            if let (Some(palette), Some(before)) = (palette.as_deref(), degraded_before)
                && !budget_reported
                && palette.degraded_count() > before
            {
                budget_reported = true;
                out.degrade(Degradation::ColorBudgetExhausted {
                    capacity: palette.capacity(),
                });
            }
        }

        out
    }

    /// Render a chapter; image placeholders stay as centred `[IMG:n]` lines.
    pub fn render(&self, bytes: &[u8], width: usize) -> RenderedChapter {
        let columns = RenderConfig::effective_width(width);
        self.render_inner(bytes, width, None, |image, out, _| {
            let placeholder = classify::image_placeholder(image.index);
            out.lines.push(RenderLine::PlainText(center_block(&placeholder, columns)));
        })
    }

    /// Render a chapter, replacing placeholders with half-block images.
    ///
    /// Image paths are resolved against `chapter_path` through `source`.
    /// Image cells and code colours take their pairs from `palette`.
    pub fn render_with_images(
        &self,
        bytes: &[u8],
        width: usize,
        chapter_path: &str,
        source: &dyn ChapterSource,
        palette: &mut ColorPalette,
    ) -> RenderedChapter {
        let columns = RenderConfig::effective_width(width);
        if !self.config.image.enabled {
            return self.render_inner(bytes, width, Some(palette), |image, out, _| {
                let placeholder = classify::image_placeholder(image.index);
                out.lines.push(RenderLine::PlainText(center_block(&placeholder, columns)));
            });
        }

        let max_cols = columns
            .saturating_sub(IMAGE_MARGIN)
            .min(self.config.image.max_cols)
            .max(1);
        let max_rows = self.config.image.max_rows;

        self.render_inner(bytes, width, Some(palette), |image, out, palette| {
            let Some(palette) = palette else {
                return;
            };
            let path = source.resolve_relative_path(chapter_path, &image.src);
            let rendered = source
                .image_bytes(&path)
                .map_err(|e| Degradation::ImageDecode {
                    src: image.src.clone(),
                    reason: e.to_string(),
                })
                .and_then(|bytes| self.images.render(&bytes, &path, max_cols, max_rows, palette));

            match rendered {
                Ok(ImageOutcome::Grid(grid)) => {
                    let pad = columns.saturating_sub(grid.cols) / 2;
                    for row in grid.rows {
                        let mut colors = vec![(Rgb::BLACK, Rgb::BLACK); pad];
                        colors.extend(row.colors);
                        out.lines.push(RenderLine::ImageRow {
                            text: format!("{}{}", " ".repeat(pad), row.text),
                            colors,
                        });
                    }
                }
                Ok(ImageOutcome::Decorative(glyph)) => {
                    out.lines
                        .push(RenderLine::PlainText(center_block(&glyph.to_string(), columns)));
                }
                Err(degradation) => {
                    log::warn!("{degradation}");
                    let marker = format!("[Error loading image: {}]", image.src);
                    out.lines.push(RenderLine::PlainText(center_block(&marker, columns)));
                    out.degradations.push(degradation);
                }
            }
        })
    }

    /// Plain-text lines for dumps: no images, colours or markers.
    pub fn render_plain(&self, bytes: &[u8], width: usize) -> Vec<String> {
        let width = RenderConfig::effective_width(width);
        let prepared = self.prepare(bytes, Mode::Dump);

        let mut lines = Vec::new();
        for (group, category) in &prepared.groups {
            if parse_placeholder(group.text.trim()).is_some() {
                continue;
            }
            layout_plain(*category, &group.text, width, &mut lines);
        }
        lines
    }
}

/// Render a chapter with the default configuration.
pub fn render_chapter(bytes: &[u8], width: usize) -> RenderedChapter {
    ChapterRenderer::new().render(bytes, width)
}

/// Plain-text dump of a chapter with the default configuration.
pub fn render_chapter_plain(bytes: &[u8], width: usize) -> Vec<String> {
    ChapterRenderer::new().render_plain(bytes, width)
}
