pub mod buffer;
pub mod coloring;
pub mod error;
pub mod export;
pub mod kernel;
pub mod pool;
pub mod renderer;

pub use buffer::{FrameBuffer, FrameSink};
pub use coloring::{hsv_to_rgb, Colorizer};
pub use error::RenderError;
pub use export::{export_png, SnapshotMetadata};
pub use kernel::{render_band, EscapeTimeKernel, TileKernel};
pub use pool::WorkerPool;
pub use renderer::render_frame;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
