use thiserror::Error;

use crate::config::ClientConfigError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON from backend: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to load zones: {0}")]
    Directory(#[from] sim_geo::DirectoryError),
    #[error(transparent)]
    Config(#[from] ClientConfigError),
    #[error("no zone source configured (set zones_url or zones_path)")]
    NoZoneSource,
}

impl ClientError {
    /// True for failures of the connection itself rather than of the payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Status { .. } | ClientError::Io(_)
        )
    }
}
