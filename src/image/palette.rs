//! Bounded colour-pair table for terminals with a limited palette.
//!
//! Terminals address foreground/background combinations through a finite
//! number of colour-pair slots. Colours are first quantized to a small
//! fixed palette so that nearby shades share a slot, then mapped onto the
//! xterm 256-colour indices.

use std::collections::HashMap;

use crate::highlight::{DualColor, Rgb, Theme};

/// Pair slots available by default (curses guarantees at least 256).
pub const DEFAULT_PAIR_CAPACITY: usize = 240;

/// Outcome of a pair request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Slot holding exactly the requested foreground/background.
    Pair(u16),
    /// Slot holding the requested colours swapped; draw the complementary
    /// glyph with swapped colours.
    Reversed(u16),
    /// No slot left; draw with the default pair.
    Degraded,
}

/// 16 grays followed by a 4×4×3 colour cube.
fn build_palette() -> Vec<Rgb> {
    let mut palette = Vec::with_capacity(64);
    for i in 0..16u16 {
        let gray = (i * 255 / 15) as u8;
        palette.push(Rgb::new(gray, gray, gray));
    }
    for r in 0..4u16 {
        for g in 0..4u16 {
            for b in 0..3u16 {
                palette.push(Rgb::new(
                    (r * 255 / 3) as u8,
                    (g * 255 / 3) as u8,
                    (b * 255 / 2) as u8,
                ));
            }
        }
    }
    palette
}

/// Perceptually weighted squared distance (the eye favours green).
fn weighted_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = (a.r as f64 - b.r as f64) * 0.3;
    let dg = (a.g as f64 - b.g as f64) * 0.59;
    let db = (a.b as f64 - b.b as f64) * 0.11;
    dr * dr + dg * dg + db * db
}

/// Map a colour to its xterm 256-colour index.
///
/// Near-grays use the 24-step gray ramp (or pure black/white), everything
/// else the 6×6×6 cube.
pub fn rgb_to_color_index(rgb: Rgb) -> u8 {
    let (r, g, b) = (rgb.r as u16, rgb.g as u16, rgb.b as u16);
    if r.abs_diff(g) < 12 && g.abs_diff(b) < 12 && r.abs_diff(b) < 12 {
        let gray = (r + g + b) / 3;
        return match gray {
            0..8 => 0,
            249.. => 15,
            _ => 232 + ((gray - 8) * 23 / 240).min(23) as u8,
        };
    }
    let level = |c: u16| (c * 6 / 256).min(5) as u8;
    16 + level(r) * 36 + level(g) * 6 + level(b)
}

/// Caller-owned colour-pair allocator.
///
/// Pairs are allocated by value and reused; once `capacity` slots are
/// taken, further new combinations degrade instead of evicting.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    palette: Vec<Rgb>,
    pairs: HashMap<(u8, u8), u16>,
    capacity: usize,
    degraded: usize,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorPalette {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PAIR_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            palette: build_palette(),
            pairs: HashMap::new(),
            capacity,
            degraded: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of requests that could not get a slot so far.
    pub fn degraded_count(&self) -> usize {
        self.degraded
    }

    pub fn is_exhausted(&self) -> bool {
        self.pairs.len() >= self.capacity
    }

    /// Closest colour of the fixed palette.
    pub fn nearest(&self, target: Rgb) -> Rgb {
        self.palette
            .iter()
            .copied()
            .min_by(|a, b| weighted_distance(target, *a).total_cmp(&weighted_distance(target, *b)))
            .unwrap_or(target)
    }

    /// 256-colour index of the quantized colour.
    pub fn quantize(&self, color: Rgb) -> u8 {
        rgb_to_color_index(self.nearest(color))
    }

    /// Foreground/background indices of an allocated pair.
    pub fn pair_colors(&self, id: u16) -> Option<(u8, u8)> {
        self.pairs
            .iter()
            .find_map(|(&key, &slot)| (slot == id).then_some(key))
    }

    fn request(&mut self, fg: Rgb, bg: Rgb, allow_reversal: bool) -> PairOutcome {
        let key = (self.quantize(fg), self.quantize(bg));
        if let Some(&id) = self.pairs.get(&key) {
            return PairOutcome::Pair(id);
        }
        if allow_reversal && let Some(&id) = self.pairs.get(&(key.1, key.0)) {
            return PairOutcome::Reversed(id);
        }
        if self.pairs.len() < self.capacity {
            // Slot 0 is the terminal default
            let id = self.pairs.len() as u16 + 1;
            self.pairs.insert(key, id);
            return PairOutcome::Pair(id);
        }
        self.degraded += 1;
        PairOutcome::Degraded
    }

    /// Pair for a half-block cell, reusing a reversed pair when possible.
    pub fn pair(&mut self, fg: Rgb, bg: Rgb) -> PairOutcome {
        self.request(fg, bg, true)
    }

    /// Pair for a syntax colour on the theme's background.
    pub fn syntax_pair(&mut self, color: DualColor, theme: Theme) -> PairOutcome {
        let background = match theme {
            Theme::Dark => Rgb::BLACK,
            Theme::Light => Rgb::new(255, 255, 255),
        };
        self.request(color.for_theme(theme), background, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::TokenCategory;

    #[test]
    fn test_palette_shape() {
        let palette = build_palette();
        assert_eq!(palette.len(), 64);
        assert_eq!(palette[0], Rgb::BLACK);
        assert_eq!(palette[15], Rgb::new(255, 255, 255));
        assert_eq!(palette[63], Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_nearest_prefers_close_gray() {
        let palette = ColorPalette::new();
        assert_eq!(palette.nearest(Rgb::new(130, 128, 129)), Rgb::new(136, 136, 136));
    }

    #[test]
    fn test_color_index() {
        assert_eq!(rgb_to_color_index(Rgb::new(0, 0, 0)), 0);
        assert_eq!(rgb_to_color_index(Rgb::new(255, 255, 255)), 15);
        assert_eq!(rgb_to_color_index(Rgb::new(128, 128, 128)), 232 + 11);
        assert_eq!(rgb_to_color_index(Rgb::new(255, 0, 0)), 196);
        assert_eq!(rgb_to_color_index(Rgb::new(0, 0, 255)), 21);
    }

    #[test]
    fn test_pair_reuse_and_reversal() {
        let mut palette = ColorPalette::new();
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);

        assert_eq!(palette.pair(red, blue), PairOutcome::Pair(1));
        assert_eq!(palette.pair(red, blue), PairOutcome::Pair(1));
        assert_eq!(palette.pair(blue, red), PairOutcome::Reversed(1));
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.pair_colors(1), Some((196, 21)));
    }

    #[test]
    fn test_exhaustion_degrades() {
        let mut palette = ColorPalette::with_capacity(1);
        assert_eq!(
            palette.pair(Rgb::BLACK, Rgb::new(255, 255, 255)),
            PairOutcome::Pair(1)
        );
        assert!(palette.is_exhausted());
        assert_eq!(
            palette.pair(Rgb::new(255, 0, 0), Rgb::BLACK),
            PairOutcome::Degraded
        );
        assert_eq!(palette.degraded_count(), 1);
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn test_syntax_pair_never_reversed() {
        let mut palette = ColorPalette::new();
        let keyword = TokenCategory::Keyword.color();
        let first = palette.syntax_pair(keyword, Theme::Dark);
        assert!(matches!(first, PairOutcome::Pair(_)));
        assert_eq!(palette.syntax_pair(keyword, Theme::Dark), first);
    }
}
