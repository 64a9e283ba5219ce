//! Rendering configuration.
//!
//! All settings have defaults matching the reader's historical behaviour;
//! use the `with_*` builders to adjust individual knobs.

use crate::highlight::Theme;

/// Width used when the caller passes 0.
pub const DEFAULT_WIDTH: usize = 100;

/// Narrowest supported layout width.
pub const MIN_WIDTH: usize = 20;

/// Configuration for a chapter render.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Block classifier settings.
    pub classifier: ClassifierConfig,
    /// Inline image settings.
    pub image: ImageConfig,
    /// Break long code lines at syntactic boundaries instead of leaving them
    /// for the pager to clip.
    pub wrap_code: bool,
    /// Background the syntax colour pairs are allocated for.
    pub theme: Theme,
}

impl RenderConfig {
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_image(mut self, image: ImageConfig) -> Self {
        self.image = image;
        self
    }

    pub fn with_wrap_code(mut self, wrap_code: bool) -> Self {
        self.wrap_code = wrap_code;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Normalise a requested width: 0 means the default, narrow widths are raised.
    pub fn effective_width(width: usize) -> usize {
        match width {
            0 => DEFAULT_WIDTH,
            w => w.max(MIN_WIDTH),
        }
    }
}

/// Configuration for the block classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Class-token substring that marks an element's text as prose
    /// (case-insensitive). `None` disables prose marking entirely.
    ///
    /// The default `"text"` is broad: it also matches tokens such as
    /// `contextual` or `text-muted`.
    pub prose_class_marker: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            prose_class_marker: Some("text".to_string()),
        }
    }
}

impl ClassifierConfig {
    pub fn with_prose_class_marker(mut self, marker: Option<&str>) -> Self {
        self.prose_class_marker = marker.map(str::to_ascii_lowercase);
        self
    }

    /// Whether a single class token carries the prose marker.
    pub(crate) fn is_prose_token(&self, token: &str) -> bool {
        match &self.prose_class_marker {
            Some(marker) if !marker.is_empty() => token.to_ascii_lowercase().contains(marker.as_str()),
            _ => false,
        }
    }
}

/// Configuration for inline image rendering.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Render images at all; when false placeholders stay as `[IMG:n]` lines.
    pub enabled: bool,
    /// Upper bound on image width in cells.
    pub max_cols: usize,
    /// Upper bound on image height in cells.
    pub max_rows: usize,
    /// Random samples averaged per half cell.
    pub samples: usize,
    /// Glyph emitted in place of decorative images.
    pub decorative_glyph: char,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_cols: 80,
            max_rows: 30,
            samples: 6,
            decorative_glyph: '◆',
        }
    }
}

impl ImageConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_cols(mut self, max_cols: usize) -> Self {
        self.max_cols = max_cols;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    pub fn with_decorative_glyph(mut self, glyph: char) -> Self {
        self.decorative_glyph = glyph;
        self
    }
}
