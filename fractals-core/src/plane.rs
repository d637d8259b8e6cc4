use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Output surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidResolution { width, height });
        }
        Ok(Self { width, height })
    }

    /// The aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// An axis-aligned rectangle of the complex plane.
///
/// `x` runs along the real axis, `y` along the imaginary axis. Row 0 of the
/// output maps to `y_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlaneRect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> crate::Result<Self> {
        let rect = Self {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        if !rect.is_valid() {
            return Err(CoreError::InvalidPlane {
                reason: format!("[{x_min}, {x_max}] × [{y_min}, {y_max}] is empty or non-finite"),
            });
        }
        Ok(rect)
    }

    /// The starting view for a surface with the given aspect ratio.
    ///
    /// The imaginary axis spans `[-1.5, 1.5]`; the real axis spans `3 · ratio`
    /// units, 60 % of it left of the origin.
    pub fn initial(aspect_ratio: f64) -> Self {
        let x_len = 3.0 * aspect_ratio;
        Self {
            x_min: -x_len * 0.6,
            x_max: x_len * 0.4,
            y_min: -1.5,
            y_max: 1.5,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// `true` when both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_min < self.x_max
            && self.y_min < self.y_max
    }
}

/// Largest quantized width or height a [`Tiling`] may produce.
pub const MAX_SIDE: u32 = 1 << 15;

/// How the surface is split: a preview downsample divisor and the number of
/// horizontal bands (one per worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiling {
    pub scaling: u32,
    pub workers: u32,
}

impl Tiling {
    pub fn new(scaling: u32, workers: u32) -> crate::Result<Self> {
        if scaling == 0 || workers == 0 {
            return Err(CoreError::InvalidTiling {
                reason: format!("scaling ({scaling}) and workers ({workers}) must be >= 1"),
            });
        }
        let tiling = Self { scaling, workers };
        tiling.checked_factor()?;
        Ok(tiling)
    }

    /// Height quantum: every band must hold a whole number of preview rows.
    pub fn factor(&self) -> u32 {
        self.scaling.saturating_mul(self.workers)
    }

    fn checked_factor(&self) -> crate::Result<u32> {
        match self.scaling.checked_mul(self.workers) {
            Some(factor) if factor > 0 => Ok(factor),
            _ => Err(CoreError::InvalidTiling {
                reason: format!(
                    "scaling ({}) × workers ({}) is out of range",
                    self.scaling, self.workers
                ),
            }),
        }
    }

    /// Grow a surface size to the smallest resolution that covers it and tiles
    /// evenly.
    ///
    /// Height becomes a multiple of [`factor`](Self::factor); width follows the
    /// surface aspect ratio, rounded to a multiple of `scaling` and never
    /// narrower than the surface. Fails when either side would exceed
    /// [`MAX_SIDE`].
    pub fn quantize(&self, surface_width: u32, surface_height: u32) -> crate::Result<Resolution> {
        if surface_width == 0 || surface_height == 0 {
            return Err(CoreError::InvalidResolution {
                width: surface_width,
                height: surface_height,
            });
        }
        let factor = self.checked_factor()?;
        let too_large = || CoreError::InvalidTiling {
            reason: format!(
                "{surface_width}×{surface_height} at scaling {} over {} bands exceeds {MAX_SIDE} px",
                self.scaling, self.workers
            ),
        };

        let height = surface_height
            .div_ceil(factor)
            .checked_mul(factor)
            .ok_or_else(too_large)?;
        let min_width = surface_width
            .div_ceil(self.scaling)
            .checked_mul(self.scaling)
            .ok_or_else(too_large)?;

        let ratio = surface_width as f64 / surface_height as f64;
        let stretched = ((height as f64 * ratio / self.scaling as f64).floor() as u32)
            .checked_mul(self.scaling)
            .ok_or_else(too_large)?;
        let width = stretched.max(min_width);
        if width > MAX_SIDE || height > MAX_SIDE {
            return Err(too_large());
        }

        Resolution::new(width, height)
    }
}

/// Everything a dispatch needs to know about the output geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSetup {
    pub resolution: Resolution,
    pub plane: PlaneRect,
    pub scaling: u32,
    pub workers: u32,
}

impl RenderSetup {
    pub fn new(resolution: Resolution, plane: PlaneRect, tiling: Tiling) -> crate::Result<Self> {
        if resolution.height % tiling.factor() != 0 || resolution.width % tiling.scaling != 0 {
            return Err(CoreError::InvalidTiling {
                reason: format!(
                    "{}×{} does not tile into {} bands at scaling {}",
                    resolution.width, resolution.height, tiling.workers, tiling.scaling
                ),
            });
        }
        if !plane.is_valid() {
            return Err(CoreError::InvalidPlane {
                reason: "render setup needs a non-empty plane".into(),
            });
        }
        Ok(Self {
            resolution,
            plane,
            scaling: tiling.scaling,
            workers: tiling.workers,
        })
    }

    /// Height of one horizontal band in output pixels.
    pub fn band_height(&self) -> u32 {
        self.resolution.height / self.workers
    }
}
