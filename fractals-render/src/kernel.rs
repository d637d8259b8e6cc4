use fractals_core::{Complex, Fractal, FractalKind, Julia, Mandelbrot, TileRequest};

use crate::coloring::Colorizer;

/// Work executed by a pool worker for each request it receives.
///
/// A kernel owns whatever per-worker state it needs; the pool never shares one
/// kernel between threads.
pub trait TileKernel {
    /// Produce the packed RGBA band for `request`, `request.byte_len()` bytes.
    fn render_tile(&mut self, request: &TileRequest) -> Vec<u8>;
}

/// The production kernel: escape-time iteration plus HSV colorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeTimeKernel;

impl TileKernel for EscapeTimeKernel {
    fn render_tile(&mut self, request: &TileRequest) -> Vec<u8> {
        render_band(request)
    }
}

/// Render one band. Stateless; safe to call from any thread.
pub fn render_band(request: &TileRequest) -> Vec<u8> {
    match request.fractal.kind {
        FractalKind::Mandelbrot => {
            colorize_band(&Mandelbrot::new(request.max_iterations), request)
        }
        FractalKind::Julia => colorize_band(
            &Julia::new(request.fractal.julia_seed, request.max_iterations),
            request,
        ),
    }
}

/// Sample the band on a `sampled_width × sampled_band_height` grid and
/// replicate each sample into a `stride × stride` block of output pixels.
fn colorize_band<F: Fractal>(fractal: &F, request: &TileRequest) -> Vec<u8> {
    let plane = request.band_plane();
    let cols = request.sampled_width() as usize;
    let rows = request.sampled_band_height() as usize;
    let stride = request.sampling_stride as usize;
    let colorizer = Colorizer::new(request.color, request.max_iterations);

    let re_step = plane.width() / cols as f64;
    let im_step = plane.height() / rows as f64;

    let mut pixels = Vec::with_capacity(request.byte_len());
    let mut row_colors = Vec::with_capacity(cols);
    for row in 0..rows {
        let im = plane.y_min + im_step * row as f64;
        row_colors.clear();
        row_colors.extend((0..cols).map(|col| {
            let re = plane.x_min + re_step * col as f64;
            colorizer.color(fractal.iterate(Complex::new(re, im)))
        }));

        for _ in 0..stride {
            for &[r, g, b] in &row_colors {
                for _ in 0..stride {
                    pixels.extend_from_slice(&[r, g, b, 255]);
                }
            }
        }
    }
    pixels
}
