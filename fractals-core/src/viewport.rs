use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::plane::{PlaneRect, RenderSetup, Resolution, Tiling};

/// Tuning constants for pan and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationLimits {
    /// Fraction of a pointer movement applied to the plane.
    pub pan_damping: f64,
    /// Largest zoom step a single call may apply, in scroll units.
    pub zoom_speed_lock: f64,
    /// Plane units per pixel below which zooming in further is refused.
    pub precision_floor: f64,
}

impl Default for NavigationLimits {
    fn default() -> Self {
        Self {
            pan_damping: 0.8,
            zoom_speed_lock: 50.0,
            precision_floor: 9.0e-16,
        }
    }
}

/// Owns the visible plane rectangle and the output resolution, and turns
/// pixel-space pan and scroll-space zoom into plane updates.
///
/// Every successful mutation raises the dirty flag; the scheduler consumes it
/// with [`take_dirty`](Self::take_dirty).
#[derive(Debug, Clone)]
pub struct ViewportTransform {
    resolution: Resolution,
    plane: PlaneRect,
    base_plane: PlaneRect,
    tiling: Tiling,
    limits: NavigationLimits,
    dirty: bool,
}

impl ViewportTransform {
    /// Build a transform for a surface of the given size. Starts dirty.
    pub fn new(
        surface_width: u32,
        surface_height: u32,
        tiling: Tiling,
        limits: NavigationLimits,
    ) -> crate::Result<Self> {
        let resolution = tiling.quantize(surface_width, surface_height)?;
        let base_plane = PlaneRect::initial(surface_width as f64 / surface_height as f64);
        Ok(Self {
            resolution,
            plane: base_plane,
            base_plane,
            tiling,
            limits,
            dirty: true,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn plane(&self) -> PlaneRect {
        self.plane
    }

    pub fn base_plane(&self) -> PlaneRect {
        self.base_plane
    }

    pub fn tiling(&self) -> Tiling {
        self.tiling
    }

    pub fn limits(&self) -> &NavigationLimits {
        &self.limits
    }

    /// Snapshot of the geometry for the next dispatch.
    pub fn setup(&self) -> RenderSetup {
        RenderSetup {
            resolution: self.resolution,
            plane: self.plane,
            scaling: self.tiling.scaling,
            workers: self.tiling.workers,
        }
    }

    /// Plane units per pixel along the real axis.
    pub fn particle_width(&self) -> f64 {
        self.plane.width() / self.resolution.width as f64
    }

    /// Plane units per pixel along the imaginary axis.
    pub fn particle_height(&self) -> f64 {
        self.plane.height() / self.resolution.height as f64
    }

    fn width_height_ratio(&self) -> f64 {
        self.resolution.aspect_ratio()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Return the dirty flag and clear it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Shift the plane by a pixel delta. Dragging right moves the view left.
    pub fn pan(&mut self, dx_pixels: f64, dy_pixels: f64) {
        let x_move = self.particle_width() * dx_pixels * self.limits.pan_damping;
        let y_move = self.particle_height() * dy_pixels * self.limits.pan_damping;

        self.plane.x_min -= x_move;
        self.plane.x_max -= x_move;
        self.plane.y_min -= y_move;
        self.plane.y_max -= y_move;

        self.dirty = true;
    }

    /// Grow (positive delta) or shrink (negative delta) the plane around its
    /// centre.
    ///
    /// `|raw_delta|` is capped at `zoom_speed_lock`. Returns `false` when the
    /// call was refused: a zero or non-finite delta, a zoom-in past the
    /// precision floor, or a step that would collapse the rectangle.
    pub fn zoom(&mut self, raw_delta: f64) -> bool {
        if raw_delta == 0.0 || !raw_delta.is_finite() {
            return false;
        }
        let delta = raw_delta.signum() * raw_delta.abs().min(self.limits.zoom_speed_lock);

        let x_particle = self.particle_width();
        if x_particle.abs() < self.limits.precision_floor && delta < 0.0 {
            trace!(x_particle, delta, "Zoom refused at precision floor");
            return false;
        }

        let x_shrink = x_particle * delta * self.width_height_ratio();
        let y_shrink = self.particle_height() * delta;
        let next = PlaneRect {
            x_min: self.plane.x_min - x_shrink,
            x_max: self.plane.x_max + x_shrink,
            y_min: self.plane.y_min - y_shrink,
            y_max: self.plane.y_max + y_shrink,
        };
        if !next.is_valid() {
            trace!(delta, "Zoom refused: plane would collapse");
            return false;
        }

        self.plane = next;
        self.dirty = true;
        true
    }

    /// Return to the plane computed at the last resize.
    pub fn reset_to_base(&mut self) {
        self.plane = self.base_plane;
        self.dirty = true;
    }

    /// Recompute resolution and base plane for a new surface size.
    ///
    /// The current plane is replaced by the new base plane.
    pub fn resize(&mut self, surface_width: u32, surface_height: u32) -> crate::Result<()> {
        let resolution = self.tiling.quantize(surface_width, surface_height)?;
        self.resolution = resolution;
        self.base_plane = PlaneRect::initial(surface_width as f64 / surface_height as f64);
        self.plane = self.base_plane;
        self.dirty = true;
        Ok(())
    }
}
