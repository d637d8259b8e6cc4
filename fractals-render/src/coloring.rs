use std::f64::consts::LN_2;

use fractals_core::{ColorMode, IterationResult, TileColor};
use palette::{IntoColor, Srgb};

type HsvTriple = (f32, f32, f32);

const BLACK: HsvTriple = (0.0, 0.0, 0.0);

// ---------------------------------------------------------------------------
// HSV -> RGB
// ---------------------------------------------------------------------------

/// Convert an HSV triple to 8-bit RGB.
///
/// Hue is in degrees and wraps; saturation and value are clamped to `[0, 1]`.
/// Channels are truncated, not rounded.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let hsv: palette::Hsv = palette::Hsv::new(
        hue.rem_euclid(360.0),
        saturation.clamp(0.0, 1.0),
        value.clamp(0.0, 1.0),
    );
    let rgb: Srgb = hsv.into_color();
    [
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    ]
}

// ---------------------------------------------------------------------------
// Colorizer
// ---------------------------------------------------------------------------

/// Maps iteration results to colors for one tile.
///
/// The channel selected by [`ColorMode`] is scaled by `4n / 1000` where `n` is
/// the escape count; the other two channels keep their base value. Points that
/// never escape are black.
#[derive(Debug, Clone, Copy)]
pub struct Colorizer {
    color: TileColor,
    max_iterations: u32,
}

impl Colorizer {
    pub fn new(color: TileColor, max_iterations: u32) -> Self {
        Self {
            color,
            max_iterations,
        }
    }

    pub fn color(&self, result: IterationResult) -> [u8; 3] {
        let (h, s, v) = match result {
            IterationResult::Interior => BLACK,
            IterationResult::Escaped {
                iterations,
                norm_sq,
            } => {
                if self.color.smooth {
                    self.smooth_hsv(iterations, norm_sq)
                } else {
                    self.hsv_for(iterations)
                }
            }
        };
        hsv_to_rgb(h, s, v)
    }

    fn hsv_for(&self, iterations: u32) -> HsvTriple {
        if iterations >= self.max_iterations {
            return BLACK;
        }
        let modifier = iterations.saturating_mul(4) as f32 / 1000.0;
        let c = &self.color;
        match c.mode {
            ColorMode::Hue => (modifier * c.hue, c.saturation, c.value),
            ColorMode::Saturation => (c.hue, modifier * c.saturation, c.value),
            ColorMode::Value => (c.hue, c.saturation, modifier * c.value),
        }
    }

    /// Blend the colors of the two integer counts around the continuous
    /// escape count `n + 1 - log2(log2 |z|)`.
    fn smooth_hsv(&self, iterations: u32, norm_sq: f64) -> HsvTriple {
        let log_zn = norm_sq.ln() / 2.0;
        let nu = (log_zn / LN_2).ln() / LN_2;
        let continuous = (iterations as f64 + 1.0 - nu).max(0.0);

        let base = continuous.floor();
        let t = (continuous - base) as f32;
        let lo = self.hsv_for(base as u32);
        let hi = self.hsv_for(base as u32 + 1);
        (
            lo.0 + (hi.0 - lo.0) * t,
            lo.1 + (hi.1 - lo.1) * t,
            lo.2 + (hi.2 - lo.2) * t,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_color(mode: ColorMode, smooth: bool) -> TileColor {
        TileColor {
            hue: 359.0,
            saturation: 1.0,
            value: 1.0,
            mode,
            smooth,
        }
    }

    #[test]
    fn primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), [0, 0, 255]);
        assert_eq!(hsv_to_rgb(480.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(77.0, 0.3, 0.0), [0, 0, 0]);
        assert_eq!(hsv_to_rgb(200.0, 0.0, 1.0), [255, 255, 255]);
    }

    #[test]
    fn intermediate_hue_truncates_and_inputs_clamp() {
        assert_eq!(hsv_to_rgb(30.0, 1.0, 1.0), [255, 127, 0]);
        assert_eq!(hsv_to_rgb(-330.0, 1.0, 1.0), [255, 127, 0]);
        assert_eq!(hsv_to_rgb(0.0, 2.0, -1.0), [0, 0, 0]);
        assert_eq!(hsv_to_rgb(0.0, -1.0, 7.0), [255, 255, 255]);
    }

    #[test]
    fn interior_is_black() {
        let c = Colorizer::new(tile_color(ColorMode::Hue, true), 1000);
        assert_eq!(c.color(IterationResult::Interior), [0, 0, 0]);
    }

    #[test]
    fn value_mode_scales_value_channel() {
        let c = Colorizer::new(tile_color(ColorMode::Value, false), 1000);
        // 125 · 4 / 1000 = 0.5
        let rgb = c.color(IterationResult::Escaped {
            iterations: 125,
            norm_sq: 5.0,
        });
        assert_eq!(rgb[0], 127);
        assert_eq!(rgb[1], 0);
    }

    #[test]
    fn zero_iterations_in_hue_mode_is_red() {
        let c = Colorizer::new(tile_color(ColorMode::Hue, false), 1000);
        let rgb = c.color(IterationResult::Escaped {
            iterations: 0,
            norm_sq: 5.0,
        });
        assert_eq!(rgb, [255, 0, 0]);
    }

    #[test]
    fn smooth_matches_plain_when_fraction_vanishes() {
        // |z|² = 16 gives log2(log2 |z|) = 1, so the continuous count is n.
        let plain = Colorizer::new(tile_color(ColorMode::Saturation, false), 1000);
        let smooth = Colorizer::new(tile_color(ColorMode::Saturation, true), 1000);
        let escaped = IterationResult::Escaped {
            iterations: 40,
            norm_sq: 16.0,
        };
        let a = plain.color(escaped);
        let b = smooth.color(escaped);
        for ch in 0..3 {
            assert!(a[ch].abs_diff(b[ch]) <= 1, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn smooth_blends_towards_black_at_the_cap() {
        let c = Colorizer::new(tile_color(ColorMode::Value, true), 100);
        let rgb = c.color(IterationResult::Escaped {
            iterations: 99,
            norm_sq: 4.5,
        });
        let plain = Colorizer::new(tile_color(ColorMode::Value, false), 100).color(
            IterationResult::Escaped {
                iterations: 99,
                norm_sq: 4.5,
            },
        );
        assert!(rgb[0] <= plain[0]);
    }
}
