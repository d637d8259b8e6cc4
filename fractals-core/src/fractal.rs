use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Squared bailout radius: an orbit has escaped once `|z|² > 4`.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Lowest iteration cap the configuration surface accepts.
pub const MIN_ITERATIONS: u32 = 100;
/// Highest iteration cap the configuration surface accepts.
pub const MAX_ITERATIONS: u32 = 10_000;

/// Clamp a requested iteration cap into `[MIN_ITERATIONS, MAX_ITERATIONS]`.
pub fn clamp_max_iterations(requested: u32) -> u32 {
    requested.clamp(MIN_ITERATIONS, MAX_ITERATIONS)
}

/// The result of iterating a single point.
///
/// Only `|z|²` at escape is kept: smooth coloring needs nothing else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationResult {
    /// The orbit escaped after `iterations` steps.
    Escaped { iterations: u32, norm_sq: f64 },

    /// The orbit stayed bounded for the whole iteration budget.
    Interior,
}

/// Which generator a dispatch renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FractalKind {
    #[default]
    Mandelbrot,
    Julia,
}

impl FractalKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia => "Julia",
        }
    }
}

/// Generator selection consumed read-only by every tile of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalConfig {
    pub kind: FractalKind,
    /// Constant `c` of the Julia iteration. Ignored for Mandelbrot.
    pub julia_seed: Complex,
}

impl FractalConfig {
    pub fn default_seed() -> Complex {
        Complex::new(0.285, 0.01)
    }

    /// Replace the Julia seed, rejecting non-finite components.
    pub fn with_seed(self, seed: Complex) -> crate::Result<Self> {
        if !seed.is_finite() {
            return Err(CoreError::InvalidJuliaSeed {
                re: seed.re,
                im: seed.im,
            });
        }
        Ok(Self {
            julia_seed: seed,
            ..self
        })
    }
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            kind: FractalKind::Mandelbrot,
            julia_seed: Self::default_seed(),
        }
    }
}

/// Trait implemented by the escape-time generators.
///
/// Kernels are generic over `F: Fractal` so the inner loop is statically
/// dispatched.
pub trait Fractal {
    /// Iterate a single point of the complex plane.
    fn iterate(&self, point: Complex) -> IterationResult;

    fn max_iterations(&self) -> u32;
}
