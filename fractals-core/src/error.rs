use thiserror::Error;

/// Errors originating from the core fractal types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid resolution: {width}×{height} (both must be > 0)")]
    InvalidResolution { width: u32, height: u32 },

    #[error("invalid plane: {reason}")]
    InvalidPlane { reason: String },

    #[error("invalid Julia seed: {re} {im:+}i (must be finite)")]
    InvalidJuliaSeed { re: f64, im: f64 },

    #[error("invalid tiling: {reason}")]
    InvalidTiling { reason: String },
}
