use crate::complex::Complex;
use crate::fractal::{Fractal, IterationResult, ESCAPE_RADIUS_SQ};

/// The Mandelbrot set: `z_{n+1} = z_n² + c`, with the orbit seeded at `z₀ = c`.
#[derive(Debug, Clone)]
pub struct Mandelbrot {
    max_iterations: u32,
}

impl Mandelbrot {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl Fractal for Mandelbrot {
    fn iterate(&self, c: Complex) -> IterationResult {
        // Both regions never escape; skip the loop for them.
        if in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im) {
            return IterationResult::Interior;
        }

        let mut z = c;
        for n in 0..self.max_iterations {
            let norm_sq = z.norm_sq();
            if norm_sq > ESCAPE_RADIUS_SQ {
                return IterationResult::Escaped {
                    iterations: n,
                    norm_sq,
                };
            }
            z = z.square() + c;
        }

        IterationResult::Interior
    }

    fn max_iterations(&self) -> u32 {
        self.max_iterations
    }
}
