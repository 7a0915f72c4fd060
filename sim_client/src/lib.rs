//! Streaming client for the policy simulation backend.
//!
//! [`SimulationClient::simulate`] posts a request and hands back a
//! [`ChunkStream`], a pull-based `futures::Stream` of decoded chunks with
//! reaction comments already attached to every event.

mod client;
pub mod config;
mod error;
pub mod reactions;
mod stream;

pub use client::SimulationClient;
pub use config::{load_client_config_from_env, ClientConfig, ClientConfigError, ReactionConfig};
pub use error::ClientError;
pub use reactions::ReactionSynthesizer;
pub use stream::{ByteStream, ChunkStream};
