use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Number of entries in a pre-built color lookup table
const LUT_SIZE: usize = 64;

/// Pre-computed gradient lookup table for fast per-cell color mapping
pub type ColorLut = Vec<Color>;

/// Color scheme for rendering the sand
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    /// Warm beige-to-white, like dry sand under a lamp
    #[default]
    Sand,
    /// Deep red through orange to yellow
    Ember,
    /// Dark blue through cyan
    Ocean,
    /// Plain white
    Mono,
}

impl ColorScheme {
    pub fn name(&self) -> &str {
        match self {
            ColorScheme::Sand => "Sand",
            ColorScheme::Ember => "Ember",
            ColorScheme::Ocean => "Ocean",
            ColorScheme::Mono => "Mono",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorScheme::Sand => ColorScheme::Ember,
            ColorScheme::Ember => ColorScheme::Ocean,
            ColorScheme::Ocean => ColorScheme::Mono,
            ColorScheme::Mono => ColorScheme::Sand,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ColorScheme::Sand => ColorScheme::Mono,
            ColorScheme::Ember => ColorScheme::Sand,
            ColorScheme::Ocean => ColorScheme::Ember,
            ColorScheme::Mono => ColorScheme::Ocean,
        }
    }

    /// Gradient stops for this scheme, low value to high
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScheme::Sand => &[(166, 129, 76), (214, 183, 128), (255, 244, 214)],
            ColorScheme::Ember => &[(120, 20, 8), (230, 110, 20), (255, 220, 90)],
            ColorScheme::Ocean => &[(10, 30, 90), (30, 110, 180), (140, 235, 255)],
            ColorScheme::Mono => &[(255, 255, 255), (255, 255, 255)],
        }
    }

    /// Sample the gradient at t in [0, 1]
    pub fn sample(&self, t: f32) -> Color {
        let stops = self.stops();
        let t = t.clamp(0.0, 1.0);
        let span = (stops.len() - 1) as f32;
        let pos = t * span;
        let i = (pos as usize).min(stops.len() - 2);
        let frac = pos - i as f32;

        let (r0, g0, b0) = stops[i];
        let (r1, g1, b1) = stops[i + 1];
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * frac) as u8;
        Color::Rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// Build the lookup table for this scheme
    pub fn build_lut(&self) -> ColorLut {
        (0..LUT_SIZE)
            .map(|i| self.sample(i as f32 / (LUT_SIZE - 1) as f32))
            .collect()
    }

    /// Representative mid-gradient color, used for image export
    pub fn export_rgb(&self) -> (u8, u8, u8) {
        match self.sample(0.5) {
            Color::Rgb(r, g, b) => (r, g, b),
            _ => (255, 255, 255),
        }
    }
}

/// Map a value in [0, 1] through a pre-built LUT
pub fn map_from_lut(lut: &ColorLut, t: f32) -> Color {
    let idx = (t.clamp(0.0, 1.0) * (lut.len() - 1) as f32) as usize;
    lut[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lut_endpoints_match_stops() {
        let lut = ColorScheme::Ember.build_lut();
        assert_eq!(lut.len(), LUT_SIZE);
        assert_eq!(lut[0], Color::Rgb(120, 20, 8));
        assert_eq!(lut[LUT_SIZE - 1], Color::Rgb(255, 220, 90));
    }

    #[test]
    fn test_map_from_lut_clamps() {
        let lut = ColorScheme::Sand.build_lut();
        assert_eq!(map_from_lut(&lut, -1.0), lut[0]);
        assert_eq!(map_from_lut(&lut, 2.0), lut[LUT_SIZE - 1]);
    }

    #[test]
    fn test_scheme_cycle_roundtrip() {
        let mut scheme = ColorScheme::Sand;
        for _ in 0..4 {
            scheme = scheme.next();
        }
        assert_eq!(scheme, ColorScheme::Sand);
        assert_eq!(ColorScheme::Mono.next().prev(), ColorScheme::Mono);
    }
}
