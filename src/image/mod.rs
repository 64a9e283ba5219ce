//! Inline images as grids of half-block characters.
//!
//! Each character cell shows two source rows: `▀` painted with the top
//! colour as foreground and the bottom colour as background. Cell colours
//! come from averaging a few seeded random points of the source region,
//! which smooths photos without a resampling filter and stays
//! deterministic.
//!
//! ```
//! use termbook::image::fit_cells;
//!
//! // A 400x200 picture in an 80x30 budget keeps its 2:1 shape
//! assert_eq!(fit_cells(400, 200, 80, 30), (80, 20));
//! ```

mod filter;
mod palette;

use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ImageConfig;
use crate::error::Degradation;
use crate::highlight::Rgb;
use crate::util::{extract_image_dimensions, is_svg};

pub use filter::{DecorativeReason, decorative_dimensions, decorative_name, decorative_reason};
pub use palette::{ColorPalette, DEFAULT_PAIR_CAPACITY, PairOutcome, rgb_to_color_index};

/// Upper half block.
pub const UPPER_HALF: char = '▀';

/// Lower half block, used with swapped colours to reuse a pair.
pub const LOWER_HALF: char = '▄';

/// Smallest rendered grid, in cells, unless the budget is smaller.
const MIN_COLS: usize = 12;
const MIN_ROWS: usize = 6;

/// Images narrower than this share of the budget are enlarged.
const SMALL_IMAGE_RATIO: f64 = 0.5;

/// Share of the column budget small images are enlarged to.
const ENLARGED_RATIO: f64 = 0.75;

/// Below this chroma every pixel counts as gray.
const MONOCHROME_CHROMA: u8 = 24;

/// Chroma range that gets the saturation boost.
const BOOST_MIN_CHROMA: u8 = 4;
const BOOST_MAX_CHROMA: u8 = 40;
const BOOST_FACTOR: f64 = 1.5;

/// One row of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub text: String,
    /// Foreground and background per character.
    pub colors: Vec<(Rgb, Rgb)>,
}

/// A rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGrid {
    pub cols: usize,
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Grid(ImageGrid),
    /// The image is typography; show this glyph instead.
    Decorative(char),
}

/// Character cells for an image of `width`×`height` pixels.
///
/// Two source rows make one cell, so a cell is roughly square on screen.
/// Images that would use less than half the column budget are enlarged to
/// three quarters of it. The result is at least 12×6 cells, within budget.
pub fn fit_cells(width: u32, height: u32, max_cols: usize, max_rows: usize) -> (usize, usize) {
    let max_cols = max_cols.max(1);
    let max_rows = max_rows.max(1);
    if width == 0 || height == 0 {
        return (MIN_COLS.min(max_cols), MIN_ROWS.min(max_rows));
    }

    let aspect = width as f64 / height as f64;
    let rows_for = |cols: usize| (cols as f64 / aspect / 2.0) as usize;
    let cols_for = |rows: usize| (rows as f64 * aspect * 2.0) as usize;

    let natural = ((width / 2) as usize).min(max_cols);
    let mut cols = if (natural as f64) / (max_cols as f64) < SMALL_IMAGE_RATIO {
        (max_cols as f64 * ENLARGED_RATIO) as usize
    } else {
        natural
    };
    let mut rows = rows_for(cols);
    if rows > max_rows {
        rows = max_rows;
        cols = cols_for(rows);
    }

    (
        cols.min(max_cols).max(MIN_COLS.min(max_cols)),
        rows.min(max_rows).max(MIN_ROWS.min(max_rows)),
    )
}

/// Pixel grid inside `cols`×`rows` cells that keeps the image's shape.
fn sample_grid(width: u32, height: u32, cols: usize, rows: usize) -> (usize, usize) {
    let aspect = width as f64 / height as f64;
    let max_h = rows * 2;
    let mut w = cols;
    let mut h = (w as f64 / aspect).round() as usize;
    if h > max_h {
        h = max_h;
        w = ((h as f64 * aspect).round() as usize).clamp(1, cols);
    }
    let h = (h.max(2) + 1) / 2 * 2;
    (w.max(1), h.min(max_h.max(2)))
}

fn chroma(c: Rgb) -> u8 {
    let max = c.r.max(c.g).max(c.b);
    let min = c.r.min(c.g).min(c.b);
    max - min
}

/// Push a near-gray colour away from its gray level.
fn boost(c: Rgb) -> Rgb {
    let chroma = chroma(c);
    if !(BOOST_MIN_CHROMA..BOOST_MAX_CHROMA).contains(&chroma) {
        return c;
    }
    let mean = (c.r as f64 + c.g as f64 + c.b as f64) / 3.0;
    let push = |v: u8| (mean + (v as f64 - mean) * BOOST_FACTOR).round().clamp(0.0, 255.0) as u8;
    Rgb::new(push(c.r), push(c.g), push(c.b))
}

/// Renders decoded images into cell grids.
#[derive(Debug, Clone, Default)]
pub struct ImageRenderer {
    config: ImageConfig,
}

impl ImageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Render image bytes named `name` within a `max_cols`×`max_rows` budget.
    ///
    /// Colour pairs are requested from `palette`; when it is full the
    /// truecolour cells are still returned.
    pub fn render(
        &self,
        bytes: &[u8],
        name: &str,
        max_cols: usize,
        max_rows: usize,
        palette: &mut ColorPalette,
    ) -> Result<ImageOutcome, Degradation> {
        let glyph = self.config.decorative_glyph;
        if decorative_name(name) {
            return Ok(ImageOutcome::Decorative(glyph));
        }
        // Header sizes reject tiny images without a full decode
        if let Some((width, height)) = extract_image_dimensions(bytes)
            && decorative_dimensions(width, height).is_some()
        {
            return Ok(ImageOutcome::Decorative(glyph));
        }

        let decode_error = |reason: String| Degradation::ImageDecode {
            src: name.to_string(),
            reason,
        };
        if is_svg(bytes) {
            return Err(decode_error("SVG images cannot be rasterized".to_string()));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| decode_error(e.to_string()))?
            .to_rgb8();

        if let Some(reason) = decorative_reason(name, &image) {
            log::trace!("{name} is decorative ({reason:?})");
            return Ok(ImageOutcome::Decorative(glyph));
        }

        let (width, height) = image.dimensions();
        let (cols, rows) = fit_cells(width, height, max_cols, max_rows);
        let (grid_w, grid_h) = sample_grid(width, height, cols, rows);

        let pixels = self.sample(&image, grid_w, grid_h);
        Ok(ImageOutcome::Grid(cells(&pixels, grid_w, grid_h, palette)))
    }

    /// Average `samples` seeded random points per output pixel.
    fn sample(&self, image: &RgbImage, grid_w: usize, grid_h: usize) -> Vec<Rgb> {
        let (width, height) = image.dimensions();
        let samples = self.config.samples.max(1);
        let mut out = Vec::with_capacity(grid_w * grid_h);

        for y in 0..grid_h {
            let y0 = y as u64 * height as u64 / grid_h as u64;
            let y1 = ((y as u64 + 1) * height as u64 / grid_h as u64).max(y0 + 1);
            for x in 0..grid_w {
                let x0 = x as u64 * width as u64 / grid_w as u64;
                let x1 = ((x as u64 + 1) * width as u64 / grid_w as u64).max(x0 + 1);

                let mut rng = StdRng::seed_from_u64(((y as u64) << 32) | x as u64);
                let mut sum = [0u32; 3];
                for _ in 0..samples {
                    let sx = rng.random_range(x0..x1) as u32;
                    let sy = rng.random_range(y0..y1) as u32;
                    let p = image.get_pixel(sx.min(width - 1), sy.min(height - 1)).0;
                    for (acc, v) in sum.iter_mut().zip(p) {
                        *acc += v as u32;
                    }
                }
                let n = samples as u32;
                out.push(Rgb::new(
                    (sum[0] / n) as u8,
                    (sum[1] / n) as u8,
                    (sum[2] / n) as u8,
                ));
            }
        }

        if out.iter().all(|&c| chroma(c) < MONOCHROME_CHROMA) {
            return out;
        }
        out.into_iter().map(boost).collect()
    }
}

/// Pair up pixel rows into half-block cells.
fn cells(pixels: &[Rgb], grid_w: usize, grid_h: usize, palette: &mut ColorPalette) -> ImageGrid {
    let mut rows = Vec::with_capacity(grid_h / 2);
    for y in (0..grid_h).step_by(2) {
        let mut text = String::with_capacity(grid_w * 3);
        let mut colors = Vec::with_capacity(grid_w);
        for x in 0..grid_w {
            let top = pixels[y * grid_w + x];
            let bottom = if y + 1 < grid_h {
                pixels[(y + 1) * grid_w + x]
            } else {
                top
            };
            match palette.pair(top, bottom) {
                PairOutcome::Reversed(_) => {
                    text.push(LOWER_HALF);
                    colors.push((bottom, top));
                }
                PairOutcome::Pair(_) | PairOutcome::Degraded => {
                    text.push(UPPER_HALF);
                    colors.push((top, bottom));
                }
            }
        }
        rows.push(GridRow { text, colors });
    }
    ImageGrid { cols: grid_w, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(image: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn photo(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x * y) % 200) as u8])
        })
    }

    #[test]
    fn test_fit_large_image() {
        assert_eq!(fit_cells(400, 200, 80, 30), (80, 20));
    }

    #[test]
    fn test_fit_small_image_enlarged() {
        // 60 px wide is 30 natural columns, under half of 80
        assert_eq!(fit_cells(60, 60, 80, 30), (60, 30));
    }

    #[test]
    fn test_fit_tall_image_limited_by_rows() {
        let (cols, rows) = fit_cells(200, 1000, 80, 30);
        assert_eq!(rows, 30);
        assert_eq!(cols, 12);
    }

    #[test]
    fn test_fit_respects_tiny_budget() {
        assert_eq!(fit_cells(400, 400, 8, 4), (8, 4));
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let bytes = png(&photo(120, 90));
        let renderer = ImageRenderer::new();
        let a = renderer.render(&bytes, "fig.png", 40, 20, &mut ColorPalette::new());
        let b = renderer.render(&bytes, "fig.png", 40, 20, &mut ColorPalette::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_grid_rows_and_colors_line_up() {
        let bytes = png(&photo(160, 80));
        let outcome = ImageRenderer::new()
            .render(&bytes, "fig.png", 80, 30, &mut ColorPalette::new())
            .unwrap();
        let ImageOutcome::Grid(grid) = outcome else {
            panic!("expected a grid");
        };
        assert!(!grid.rows.is_empty());
        for row in &grid.rows {
            assert_eq!(row.text.chars().count(), grid.cols);
            assert_eq!(row.colors.len(), grid.cols);
            assert!(row.text.chars().all(|c| c == UPPER_HALF || c == LOWER_HALF));
        }
    }

    #[test]
    fn test_tiny_bullet_is_decorative() {
        let bytes = png(&photo(8, 8));
        let outcome = ImageRenderer::new()
            .render(&bytes, "bullet.png", 80, 30, &mut ColorPalette::new())
            .unwrap();
        assert_eq!(outcome, ImageOutcome::Decorative('◆'));
    }

    #[test]
    fn test_flat_image_is_decorative() {
        let flat = RgbImage::from_fn(40, 40, |x, _| {
            if x < 20 { image::Rgb([200, 0, 0]) } else { image::Rgb([0, 0, 0]) }
        });
        let outcome = ImageRenderer::new()
            .render(&png(&flat), "fig.png", 80, 30, &mut ColorPalette::new())
            .unwrap();
        assert!(matches!(outcome, ImageOutcome::Decorative(_)));
    }

    #[test]
    fn test_garbage_bytes_degrade() {
        let err = ImageRenderer::new()
            .render(b"not an image", "fig.png", 80, 30, &mut ColorPalette::new())
            .unwrap_err();
        assert!(matches!(err, Degradation::ImageDecode { ref src, .. } if src == "fig.png"));
    }

    #[test]
    fn test_monochrome_not_boosted() {
        let gray = RgbImage::from_fn(100, 100, |x, y| {
            let v = ((x + y) * 255 / 200) as u8;
            image::Rgb([v, v.saturating_add(5), v])
        });
        let renderer = ImageRenderer::new();
        let pixels = renderer.sample(&gray, 10, 10);
        assert!(pixels.iter().all(|&c| chroma(c) < MONOCHROME_CHROMA));
        // Chroma of 5 would be boosted to 7 or 8 in a colour image
        assert!(pixels.iter().all(|&c| chroma(c) <= 5));
    }

    #[test]
    fn test_boost_only_near_gray() {
        assert_eq!(boost(Rgb::new(255, 0, 0)), Rgb::new(255, 0, 0));
        assert_eq!(boost(Rgb::new(100, 100, 100)), Rgb::new(100, 100, 100));
        let boosted = boost(Rgb::new(110, 100, 100));
        assert!(chroma(boosted) > 10);
    }
}
