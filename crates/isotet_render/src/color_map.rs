//! Scalar to color mapping
//!
//! The auxiliary scalar interpolated onto each output vertex is turned into
//! an RGBA color through a blue-cyan-yellow-red ramp over a fixed range.

use serde::{Deserialize, Serialize};

/// RGBA color, each channel in `[0, 1]`
pub type Rgba = [f32; 4];

/// Maps scalars in `[min, max]` onto a color ramp
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    /// Scalar mapped to the low end of the ramp
    pub min: f32,
    /// Scalar mapped to the high end of the ramp
    pub max: f32,
    /// Reverse the ramp
    #[serde(default)]
    pub flip: bool,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0, flip: false }
    }
}

impl ColorMap {
    /// Create a new color map over `[min, max]`
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max, flip: false }
    }

    /// Reverse the ramp (builder pattern)
    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    /// Color map spanning the finite values in `values`
    pub fn fit(values: &[f32]) -> Option<Self> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite.next()?;
        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self::new(min, max))
    }

    /// Position of `value` along the ramp, in `[0, 1]`
    ///
    /// An empty range maps everything to the middle; non-finite values map
    /// to the low end.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        let t = if range == 0.0 { 0.5 } else { (value - self.min) / range };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if self.flip {
            1.0 - t
        } else {
            t
        }
    }

    /// Color for a scalar value
    pub fn color(&self, value: f32) -> Rgba {
        let t = self.normalize(value);
        let channel = |center: f32| (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
        [channel(3.0), channel(2.0), channel(1.0), 1.0]
    }

    /// Colors for a run of scalars
    pub fn colors(&self, values: &[f32]) -> Vec<Rgba> {
        values.iter().map(|&v| self.color(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_ends() {
        let map = ColorMap::new(-1.0, 1.0);
        // Low end is blue-ish, high end red-ish
        assert_eq!(map.color(-1.0), [0.0, 0.0, 0.5, 1.0]);
        assert_eq!(map.color(1.0), [0.5, 0.0, 0.0, 1.0]);
        // Midpoint is green-dominant
        let mid = map.color(0.0);
        assert_eq!(mid[1], 1.0);
        assert_eq!(mid[0], mid[2]);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let map = ColorMap::new(0.0, 1.0);
        assert_eq!(map.color(-5.0), map.color(0.0));
        assert_eq!(map.color(9.0), map.color(1.0));
    }

    #[test]
    fn test_flip_reverses() {
        let map = ColorMap::new(0.0, 10.0);
        let flipped = map.with_flip(true);
        assert_eq!(flipped.color(0.0), map.color(10.0));
        assert_eq!(flipped.color(2.5), map.color(7.5));
    }

    #[test]
    fn test_degenerate_and_non_finite() {
        let map = ColorMap::new(2.0, 2.0);
        assert_eq!(map.normalize(2.0), 0.5);
        assert_eq!(map.normalize(100.0), 0.5);
        assert_eq!(ColorMap::default().normalize(f32::NAN), 0.0);
    }

    #[test]
    fn test_fit_ignores_non_finite() {
        let map = ColorMap::fit(&[3.0, f32::NAN, -1.0, f32::INFINITY, 2.0]).unwrap();
        assert_eq!(map, ColorMap::new(-1.0, 3.0));
        assert!(ColorMap::fit(&[]).is_none());
        assert!(ColorMap::fit(&[f32::NAN]).is_none());
    }

    #[test]
    fn test_colors_alpha_opaque() {
        let colors = ColorMap::default().colors(&[0.0, 0.25, 0.5, 1.0]);
        assert_eq!(colors.len(), 4);
        assert!(colors.iter().all(|c| c[3] == 1.0));
        assert!(colors.iter().flatten().all(|&ch| (0.0..=1.0).contains(&ch)));
    }
}
