//! Thresholds for gesture classification and marker placement.
//!
//! Loaded from `selection_config.json` with support for environment variable overrides.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_SELECTION_CONFIG: &str = include_str!("data/selection_config.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// A press held at least this long is not a click.
    pub click_max_duration_ms: u64,
    /// Pointer travel (screen pixels) still counted as a click.
    pub click_max_distance_px: f64,
    /// Drag rectangles smaller than this on both axes commit nothing.
    pub drag_min_size_px: f64,
    /// Distance markers are pushed inside their zone, in zone coordinate units.
    pub marker_snap_epsilon: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            click_max_duration_ms: 200,
            click_max_distance_px: 5.0,
            drag_min_size_px: 5.0,
            marker_snap_epsilon: 1e-5,
        }
    }
}

impl SelectionConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_SELECTION_CONFIG)
                .expect("builtin selection config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, SelectionConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| SelectionConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = SelectionConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn click_max_duration(&self) -> Duration {
        Duration::from_millis(self.click_max_duration_ms)
    }
}

#[derive(Debug, Error)]
pub enum SelectionConfigError {
    #[error("failed to parse selection config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read selection config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load selection configuration from `SELECTION_CONFIG_PATH`, falling back to
/// the builtin copy.
pub fn load_selection_config_from_env() -> Arc<SelectionConfig> {
    let Some(path) = env::var("SELECTION_CONFIG_PATH").ok().map(PathBuf::from) else {
        tracing::info!(
            target: "policy_sim::config",
            "selection_config.loaded=builtin"
        );
        return SelectionConfig::builtin();
    };

    match SelectionConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "policy_sim::config",
                path = %path.display(),
                "selection_config.loaded=file"
            );
            Arc::new(config)
        }
        Err(err) => {
            tracing::warn!(
                target: "policy_sim::config",
                path = %path.display(),
                error = %err,
                "selection_config.load_failed"
            );
            SelectionConfig::builtin()
        }
    }
}
