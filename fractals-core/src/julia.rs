use crate::complex::Complex;
use crate::fractal::{Fractal, IterationResult, ESCAPE_RADIUS_SQ};

/// A Julia set: `z_{n+1} = z_n² + c` for a fixed seed `c`, with `z₀` the
/// point on the complex plane.
#[derive(Debug, Clone)]
pub struct Julia {
    max_iterations: u32,
    c: Complex,
}

impl Julia {
    pub fn new(c: Complex, max_iterations: u32) -> Self {
        Self { max_iterations, c }
    }

    pub fn c(&self) -> Complex {
        self.c
    }
}

impl Fractal for Julia {
    fn iterate(&self, point: Complex) -> IterationResult {
        let mut z = point;
        for n in 0..self.max_iterations {
            let norm_sq = z.norm_sq();
            if norm_sq > ESCAPE_RADIUS_SQ {
                return IterationResult::Escaped {
                    iterations: n,
                    norm_sq,
                };
            }
            z = z.square() + self.c;
        }

        IterationResult::Interior
    }

    fn max_iterations(&self) -> u32 {
        self.max_iterations
    }
}
