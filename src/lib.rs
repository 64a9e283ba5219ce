//! # termbook
//!
//! Turns EPUB chapter markup into classified, width-wrapped terminal lines.
//!
//! ## Features
//!
//! - Headings, captions, quotes, bullet lists, tables and URL lines
//! - Paragraph reflow across the hard line breaks books are full of
//! - Code detection with syntax highlighting in dark and light colours
//! - Inline images drawn with half-block characters
//! - Malformed markup degrades instead of failing
//!
//! ## Quick Start
//!
//! ```no_run
//! use termbook::{ChapterRenderer, ChapterSource, ColorPalette, EpubArchive};
//!
//! let book = EpubArchive::open("book.epub")?;
//! let renderer = ChapterRenderer::new();
//! let mut palette = ColorPalette::new();
//!
//! for item in book.spine() {
//!     let markup = book.chapter_bytes(&item.path)?;
//!     let chapter = renderer.render_with_images(&markup, 80, &item.path, &book, &mut palette);
//!     for line in &chapter.lines {
//!         println!("{}", line.text());
//!     }
//! }
//! # Ok::<(), termbook::Error>(())
//! ```
//!
//! ## Plain dumps
//!
//! ```
//! let lines = termbook::render_chapter_plain(b"<h2>Setup</h2><p>Install it.</p>", 40);
//! assert_eq!(lines, vec!["Setup", "", "Install it.", ""]);
//! ```

pub mod classify;
pub mod config;
pub mod epub;
pub mod error;
pub mod heuristic;
pub mod highlight;
pub mod image;
pub mod layout;
pub mod patterns;
pub mod reflow;
pub mod render;
pub mod scan;
pub mod source;
pub mod util;

pub use config::{ClassifierConfig, ImageConfig, RenderConfig};
pub use epub::{EpubArchive, Metadata, SpineItem};
pub use error::{Degradation, Error, Result};
pub use highlight::{DualColor, Rgb, Theme};
pub use image::ColorPalette;
pub use render::{ChapterRenderer, RenderLine, RenderedChapter, render_chapter, render_chapter_plain};
pub use source::{ChapterSource, DirectorySource};
