//! Detection of decorative images (bullets, rules, ornaments).
//!
//! Books use tiny or flat-coloured images as typography. Rendering them as
//! a block of half-cells adds noise, so they are replaced by a glyph.

use std::collections::HashSet;

use image::RgbImage;
use image::imageops::{self, FilterType};

/// Smallest side of a content image, in pixels.
const MIN_SIDE: u32 = 24;

/// Smallest area of a content image, in pixels.
const MIN_AREA: u64 = 1024;

/// Widest (or tallest) aspect ratio of a content image.
const MAX_ASPECT: f64 = 8.0;

/// Images up to this size on both sides get the colour-count check.
const FLAT_CHECK_MAX_SIDE: u32 = 128;

/// Side of the downsample used to count colours.
const FLAT_SAMPLE_SIDE: u32 = 16;

/// At most this many distinct colours marks an image as flat.
const MAX_FLAT_COLORS: usize = 6;

const NAME_DENYLIST: &[&str] = &[
    "bullet",
    "ornament",
    "divider",
    "icon",
    "border",
    "spacer",
    "dingbat",
    "separator",
    "flourish",
    "decoration",
    "rule",
];

/// Why an image was judged decorative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorativeReason {
    Name,
    TooSmall,
    ExtremeAspect,
    FewColors,
}

/// Denylisted words in the file name (not the directory).
pub fn decorative_name(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    NAME_DENYLIST.iter().any(|word| name.contains(word))
}

/// Size and aspect checks, usable before decoding.
pub fn decorative_dimensions(width: u32, height: u32) -> Option<DecorativeReason> {
    if width < MIN_SIDE || height < MIN_SIDE || (width as u64 * height as u64) < MIN_AREA {
        return Some(DecorativeReason::TooSmall);
    }
    let aspect = width as f64 / height as f64;
    if aspect > MAX_ASPECT || aspect < 1.0 / MAX_ASPECT {
        return Some(DecorativeReason::ExtremeAspect);
    }
    None
}

fn distinct_colors(image: &RgbImage) -> usize {
    let small = imageops::resize(image, FLAT_SAMPLE_SIDE, FLAT_SAMPLE_SIDE, FilterType::Nearest);
    small.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

/// Full check of a decoded image.
pub fn decorative_reason(path: &str, image: &RgbImage) -> Option<DecorativeReason> {
    if decorative_name(path) {
        return Some(DecorativeReason::Name);
    }
    let (width, height) = image.dimensions();
    if let Some(reason) = decorative_dimensions(width, height) {
        return Some(reason);
    }
    if width <= FLAT_CHECK_MAX_SIDE
        && height <= FLAT_CHECK_MAX_SIDE
        && distinct_colors(image) <= MAX_FLAT_COLORS
    {
        return Some(DecorativeReason::FewColors);
    }
    None
}
