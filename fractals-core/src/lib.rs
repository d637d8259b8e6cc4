pub mod color;
pub mod complex;
pub mod error;
pub mod fractal;
pub mod julia;
pub mod mandelbrot;
pub mod plane;
pub mod tile;
pub mod viewport;

// Re-export primary types for convenience.
pub use color::{ColorConfig, ColorMode, TileColor};
pub use complex::Complex;
pub use error::CoreError;
pub use fractal::{
    clamp_max_iterations, Fractal, FractalConfig, FractalKind, IterationResult, MAX_ITERATIONS,
    MIN_ITERATIONS,
};
pub use julia::Julia;
pub use mandelbrot::Mandelbrot;
pub use plane::{PlaneRect, RenderSetup, Resolution, Tiling, MAX_SIDE};
pub use tile::{band_requests, TileRequest, TileResult};
pub use viewport::{NavigationLimits, ViewportTransform};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
