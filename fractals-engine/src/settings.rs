use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fractals_core::{NavigationLimits, Tiling};

// ---------------------------------------------------------------------------
// Gamepad tuning
// ---------------------------------------------------------------------------

/// How analog stick positions turn into pan and zoom steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamepadTuning {
    /// Axis magnitudes at or below this are treated as zero.
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,
    /// Pixels of pan per unit of left-stick deflection per tick.
    #[serde(default = "default_move_modifier")]
    pub move_modifier: f64,
    /// Scroll units of zoom per unit of right-stick deflection per tick.
    #[serde(default = "default_scroll_modifier")]
    pub scroll_modifier: f64,
}

impl Default for GamepadTuning {
    fn default() -> Self {
        Self {
            dead_zone: default_dead_zone(),
            move_modifier: default_move_modifier(),
            scroll_modifier: default_scroll_modifier(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine settings
// ---------------------------------------------------------------------------

/// Tuning constants for the render engine. Every field has a default, so an
/// empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Quiet period after the last change before the full-resolution pass.
    #[serde(default = "default_full_res_delay_ms")]
    pub full_res_delay_ms: u64,
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
    /// How long fetching must stay off before the loading indicator clears.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    /// Preview downsample divisor.
    #[serde(default = "default_preview_scaling")]
    pub preview_scaling: u32,
    /// `None` uses the machine's available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub navigation: NavigationLimits,
    #[serde(default)]
    pub gamepad: GamepadTuning,
}

fn default_tick_interval_ms() -> u64 {
    10
}
fn default_full_res_delay_ms() -> u64 {
    500
}
fn default_stats_interval_ms() -> u64 {
    400
}
fn default_idle_delay_ms() -> u64 {
    100
}
fn default_preview_scaling() -> u32 {
    8
}
fn default_max_iterations() -> u32 {
    1000
}
fn default_dead_zone() -> f64 {
    0.1
}
fn default_move_modifier() -> f64 {
    25.0
}
fn default_scroll_modifier() -> f64 {
    20.0
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            full_res_delay_ms: default_full_res_delay_ms(),
            stats_interval_ms: default_stats_interval_ms(),
            idle_delay_ms: default_idle_delay_ms(),
            preview_scaling: default_preview_scaling(),
            workers: None,
            max_iterations: default_max_iterations(),
            navigation: NavigationLimits::default(),
            gamepad: GamepadTuning::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn full_res_delay(&self) -> Duration {
        Duration::from_millis(self.full_res_delay_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    /// Resolved worker count, at least 1.
    pub fn worker_count(&self) -> usize {
        self.workers.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    pub fn tiling(&self) -> crate::Result<Tiling> {
        let workers = u32::try_from(self.worker_count()).unwrap_or(u32::MAX);
        Ok(Tiling::new(self.preview_scaling, workers)?)
    }
}
