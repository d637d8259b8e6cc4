use thiserror::Error;

/// Errors originating from the render engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to parse engine settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] fractals_render::RenderError),

    #[error(transparent)]
    Core(#[from] fractals_core::CoreError),
}
