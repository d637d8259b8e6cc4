use serde::{Deserialize, Serialize};

/// Which HSV channel the iteration count drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    Hue,
    Saturation,
    Value,
}

impl ColorMode {
    pub const ALL: [ColorMode; 3] = [ColorMode::Hue, ColorMode::Saturation, ColorMode::Value];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hue => "Hue",
            Self::Saturation => "Saturation",
            Self::Value => "Value",
        }
    }
}

/// Palette parameters as edited by the presentation layer.
///
/// Preview smoothing can only be on while full-resolution smoothing is on;
/// the setters maintain that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorConfig {
    /// Base hue in degrees, `[0, 360]`.
    pub hue: f32,
    /// Base saturation, `[0, 1]`.
    pub saturation: f32,
    /// Base value, `[0, 1]`.
    pub value: f32,
    pub mode: ColorMode,
    smooth_full_res: bool,
    smooth_preview: bool,
}

impl ColorConfig {
    pub fn new(hue: f32, saturation: f32, value: f32, mode: ColorMode) -> Self {
        let mut cfg = Self::default();
        cfg.set_hsv(hue, saturation, value);
        cfg.mode = mode;
        cfg
    }

    /// Set the base color, clamping each channel into range. Non-finite
    /// channels keep their previous value.
    pub fn set_hsv(&mut self, hue: f32, saturation: f32, value: f32) {
        if hue.is_finite() {
            self.hue = hue.clamp(0.0, 360.0);
        }
        if saturation.is_finite() {
            self.saturation = saturation.clamp(0.0, 1.0);
        }
        if value.is_finite() {
            self.value = value.clamp(0.0, 1.0);
        }
    }

    pub fn smooth_full_res(&self) -> bool {
        self.smooth_full_res
    }

    pub fn smooth_preview(&self) -> bool {
        self.smooth_preview
    }

    /// Disabling full-resolution smoothing also disables preview smoothing.
    pub fn set_smooth_full_res(&mut self, smooth: bool) {
        self.smooth_full_res = smooth;
        if !smooth {
            self.smooth_preview = false;
        }
    }

    /// Ignored (kept `false`) while full-resolution smoothing is off.
    pub fn set_smooth_preview(&mut self, smooth: bool) {
        self.smooth_preview = smooth && self.smooth_full_res;
    }

    /// The color parameters a single tile is rendered with.
    pub fn resolve(&self, full_res: bool) -> TileColor {
        TileColor {
            hue: self.hue,
            saturation: self.saturation,
            value: self.value,
            mode: self.mode,
            smooth: if full_res {
                self.smooth_full_res
            } else {
                self.smooth_preview
            },
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            hue: 359.0,
            saturation: 1.0,
            value: 1.0,
            mode: ColorMode::Hue,
            smooth_full_res: true,
            smooth_preview: true,
        }
    }
}

/// Color parameters with the smoothing flag already chosen for the pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileColor {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
    pub mode: ColorMode,
    pub smooth: bool,
}
