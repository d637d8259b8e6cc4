use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::debug;

use fractals_core::{TileRequest, TileResult};

use crate::buffer::FrameSink;
use crate::kernel::render_band;

/// Render every band of a dispatch in parallel and hand each one to `sink`.
///
/// Bands are computed on the rayon pool and written once all are done, in
/// band order. Used where no interactive pool is running: snapshots, tests,
/// and benchmarks.
pub fn render_frame<S: FrameSink + ?Sized>(requests: &[TileRequest], sink: &mut S) -> Duration {
    let start = Instant::now();

    let tiles: Vec<TileResult> = requests
        .par_iter()
        .map(|request| {
            let band_start = Instant::now();
            let pixels = render_band(request);
            let worker_id = rayon::current_thread_index().unwrap_or(0);
            TileResult::from_request(request, pixels, band_start.elapsed(), worker_id)
        })
        .collect();

    for tile in &tiles {
        sink.write_tile(tile);
    }

    let elapsed = start.elapsed();
    debug!(
        bands = tiles.len(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "Frame rendered"
    );
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::FrameBuffer;
    use fractals_core::{
        band_requests, ColorConfig, FractalConfig, PlaneRect, RenderSetup, Resolution, Tiling,
    };

    #[test]
    fn frame_matches_individual_bands() {
        let setup = RenderSetup::new(
            Resolution::new(48, 36).unwrap(),
            PlaneRect::initial(48.0 / 36.0),
            Tiling::new(3, 4).unwrap(),
        )
        .unwrap();
        let reqs = band_requests(
            &setup,
            120,
            FractalConfig::default(),
            &ColorConfig::default(),
            true,
        );
        let mut frame = FrameBuffer::new(48, 36);
        render_frame(&reqs, &mut frame);
        assert_eq!(frame.revision(), 4);

        let expected: Vec<u8> = reqs.iter().flat_map(render_band).collect();
        assert_eq!(frame.pixels(), &expected[..]);
    }
}
