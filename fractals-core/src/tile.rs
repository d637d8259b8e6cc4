use std::time::Duration;

use crate::color::{ColorConfig, TileColor};
use crate::fractal::FractalConfig;
use crate::plane::{PlaneRect, RenderSetup, Resolution};

/// One horizontal band of one dispatch, as sent to a compute worker.
///
/// Carries a copy of every input it needs, so a resize or config change after
/// dispatch never affects a band already in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub resolution: Resolution,
    pub plane: PlaneRect,
    /// 1 for full resolution, the preview scaling factor otherwise.
    pub sampling_stride: u32,
    pub tile_index: u32,
    pub tile_count: u32,
    pub max_iterations: u32,
    pub fractal: FractalConfig,
    pub color: TileColor,
    pub full_res: bool,
}

impl TileRequest {
    /// Band height in output pixels.
    pub fn band_height(&self) -> u32 {
        self.resolution.height / self.tile_count
    }

    /// Output row of the band's first line.
    pub fn origin_y(&self) -> u32 {
        self.tile_index * self.band_height()
    }

    /// Computed samples per row.
    pub fn sampled_width(&self) -> u32 {
        self.resolution.width / self.sampling_stride
    }

    /// Computed sample rows in this band.
    pub fn sampled_band_height(&self) -> u32 {
        self.resolution.height / self.sampling_stride / self.tile_count
    }

    /// Size of the RGBA buffer a kernel must return for this band.
    pub fn byte_len(&self) -> usize {
        self.resolution.width as usize * self.band_height() as usize * 4
    }

    /// The slice of the plane covered by this band.
    pub fn band_plane(&self) -> PlaneRect {
        let sampled_height = (self.resolution.height / self.sampling_stride) as f64;
        let split = self.sampled_band_height() as f64;
        let extent = self.plane.height();
        let y_min = self.plane.y_min + extent * (self.tile_index as f64 * split) / sampled_height;
        PlaneRect {
            x_min: self.plane.x_min,
            x_max: self.plane.x_max,
            y_min,
            y_max: y_min + extent * split / sampled_height,
        }
    }
}

/// Build one request per band for a dispatch.
pub fn band_requests(
    setup: &RenderSetup,
    max_iterations: u32,
    fractal: FractalConfig,
    color: &ColorConfig,
    full_res: bool,
) -> Vec<TileRequest> {
    let sampling_stride = if full_res { 1 } else { setup.scaling };
    let color = color.resolve(full_res);
    (0..setup.workers)
        .map(|tile_index| TileRequest {
            resolution: setup.resolution,
            plane: setup.plane,
            sampling_stride,
            tile_index,
            tile_count: setup.workers,
            max_iterations,
            fractal,
            color,
            full_res,
        })
        .collect()
}

/// A finished band, tagged with the worker that produced it.
#[derive(Debug, Clone)]
pub struct TileResult {
    /// Packed RGBA, `width × height × 4` bytes.
    pub pixels: Vec<u8>,
    pub origin_x: u32,
    pub origin_y: u32,
    pub width: u32,
    pub height: u32,
    pub tile_index: u32,
    pub full_res: bool,
    pub elapsed: Duration,
    pub worker_id: usize,
}

impl TileResult {
    pub fn from_request(
        request: &TileRequest,
        pixels: Vec<u8>,
        elapsed: Duration,
        worker_id: usize,
    ) -> Self {
        Self {
            pixels,
            origin_x: 0,
            origin_y: request.origin_y(),
            width: request.resolution.width,
            height: request.band_height(),
            tile_index: request.tile_index,
            full_res: request.full_res,
            elapsed,
            worker_id,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}
