//! Backend endpoints and client tuning.
//!
//! Loaded from `client_config.json`; `SIM_CLIENT_CONFIG_PATH` points at an
//! override file and `SIM_BACKEND_URL` replaces the base URL.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_CLIENT_CONFIG: &str = include_str!("data/client_config.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub simulate_path: String,
    pub messages_path: String,
    /// GET source of the zone FeatureCollection; wins over `zones_path`.
    pub zones_url: Option<String>,
    pub zones_path: Option<PathBuf>,
    /// Connect timeout only; a running stream is never timed out.
    pub connect_timeout_secs: u64,
    pub reactions: ReactionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            simulate_path: "/api/simulate".to_string(),
            messages_path: "/api/messages".to_string(),
            zones_url: None,
            zones_path: None,
            connect_timeout_secs: 10,
            reactions: ReactionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    pub min_comments: usize,
    pub max_comments: usize,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            min_comments: 2,
            max_comments: 5,
        }
    }
}

impl ClientConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_CLIENT_CONFIG)
                .expect("builtin client config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ClientConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ClientConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ClientConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_zones_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.zones_path = Some(path.into());
        self
    }

    pub fn simulate_url(&self) -> String {
        join_url(&self.base_url, &self.simulate_path)
    }

    pub fn messages_url(&self) -> String {
        join_url(&self.base_url, &self.messages_path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("failed to parse client config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read client config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load client configuration from `SIM_CLIENT_CONFIG_PATH` (or the builtin
/// copy), then apply `SIM_BACKEND_URL`.
pub fn load_client_config_from_env() -> Arc<ClientConfig> {
    let mut config = match env::var("SIM_CLIENT_CONFIG_PATH").ok().map(PathBuf::from) {
        Some(path) => match ClientConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "policy_sim::config",
                    path = %path.display(),
                    "client_config.loaded=file"
                );
                config
            }
            Err(err) => {
                tracing::warn!(
                    target: "policy_sim::config",
                    path = %path.display(),
                    error = %err,
                    "client_config.load_failed"
                );
                ClientConfig::builtin().as_ref().clone()
            }
        },
        None => {
            tracing::info!(target: "policy_sim::config", "client_config.loaded=builtin");
            ClientConfig::builtin().as_ref().clone()
        }
    };

    if let Ok(base_url) = env::var("SIM_BACKEND_URL") {
        tracing::info!(
            target: "policy_sim::config",
            base_url = %base_url,
            "client_config.base_url_override"
        );
        config.base_url = base_url;
    }
    Arc::new(config)
}
