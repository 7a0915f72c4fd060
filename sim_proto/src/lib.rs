//! Wire contract between the simulation client and its backend.
//!
//! The backend answers a [`SimulationRequest`] with a text stream of
//! `data: <json>\n\n` frames; each payload is a [`StreamChunk`] tagged
//! `event`, `update` or `complete`. The [`frame`] module reassembles those
//! frames from arbitrary read boundaries.

pub mod context;
pub mod event;
pub mod frame;
pub mod metrics;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use context::NeighborhoodContext;
pub use event::{EventCategory, GeoCoordinate, ReactionComment, Sentiment, SimulationEvent};
pub use frame::{decode_frame, encode_frame, DecodeStats, FrameDecoder, FrameError};
pub use metrics::{numeric_fields, MetricSample, MetricsPatch};

/// Progress signal. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateData {
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        alias = "zonesCount",
        alias = "total",
        skip_serializing_if = "Option::is_none"
    )]
    pub zones_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteData {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
#[allow(clippy::large_enum_variant)]
pub enum StreamChunk {
    Event(SimulationEvent),
    Update(UpdateData),
    Complete(CompleteData),
}

impl StreamChunk {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamChunk::Event(_) => "event",
            StreamChunk::Update(_) => "update",
            StreamChunk::Complete(_) => "complete",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, StreamChunk::Complete(_))
    }
}

/// Body of the simulate POST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub prompt: String,
    #[serde(default)]
    pub selected_zones: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighborhood_properties: Vec<Map<String, Value>>,
    /// One entry per requested zone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighborhood_context: Vec<NeighborhoodContext>,
}

/// Body of the constituent-messages POST for a single event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRequest {
    pub title: String,
    pub description: String,
    pub zone: String,
    pub positivity: f64,
    pub severity: f64,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl ReactionRequest {
    pub fn for_event(event: &SimulationEvent) -> Self {
        let title = if event.title.is_empty() {
            event.category.to_string()
        } else {
            event.title.clone()
        };
        Self {
            title,
            description: event.description.clone(),
            zone: event.owning_zone().to_string(),
            positivity: event.positivity,
            severity: event.severity,
            exclusions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituentMessage {
    pub name: String,
    pub message: String,
}
