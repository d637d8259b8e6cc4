use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use fractals_engine::EngineSettings;

/// Startup configuration read from `preferences.json` beside the executable.
///
/// Nothing is written back: the explorer keeps no session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    #[serde(default)]
    pub engine: EngineSettings,
}

fn default_window_width() -> f32 {
    1280.0
}
fn default_window_height() -> f32 {
    720.0
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            engine: EngineSettings::default(),
        }
    }
}

impl AppPreferences {
    /// Load from disk, falling back to defaults on any failure.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            debug!("No preferences file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(json) => match Self::parse(&json) {
                Ok(prefs) => {
                    info!("Loaded preferences from {}", path.display());
                    return prefs;
                }
                Err(e) => error!("Failed to parse preferences: {e}"),
            },
            Err(e) => error!("Failed to read preferences file: {e}"),
        }
        Self::default()
    }

    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn config_path() -> PathBuf {
    crate::app_dir::exe_directory().join("preferences.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let prefs = AppPreferences::parse("{}").unwrap();
        assert_eq!(prefs, AppPreferences::default());
    }

    #[test]
    fn engine_section_is_partial() {
        let prefs = AppPreferences::parse(
            r#"{ "window_width": 800, "engine": { "full_res_delay_ms": 250, "workers": 2 } }"#,
        )
        .unwrap();
        assert_eq!(prefs.window_width, 800.0);
        assert_eq!(prefs.window_height, 720.0);
        assert_eq!(prefs.engine.full_res_delay_ms, 250);
        assert_eq!(prefs.engine.workers, Some(2));
        assert_eq!(
            prefs.engine.tick_interval_ms,
            EngineSettings::default().tick_interval_ms
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppPreferences::parse("{ \"window_width\": ").is_err());
    }
}
