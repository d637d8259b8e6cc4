pub mod error;
pub mod events;
pub mod input;
pub mod progress;
pub mod scheduler;
pub mod settings;
pub mod stats;

pub use error::EngineError;
pub use events::{Observers, SubscriptionId};
pub use input::{
    ChannelGamepad, GamepadConnection, GamepadEvent, GamepadFeed, GamepadSource, InputAdapter,
};
pub use progress::ProgressTracker;
pub use scheduler::{DispatchCounts, RenderScheduler, RenderState};
pub use settings::{EngineSettings, GamepadTuning};
pub use stats::{StatsAggregator, WorkerStat};

/// Convenience result type for the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
