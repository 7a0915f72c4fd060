use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsPatch;

/// Latitude/longitude pair, carried on the wire as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lon: f64,
}

impl GeoCoordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<[f64; 2]> for GeoCoordinate {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoCoordinate> for [f64; 2] {
    fn from(coord: GeoCoordinate) -> Self {
        [coord.lat, coord.lon]
    }
}

/// Event category tag. The backend treats it as free text, so anything
/// unrecognised survives as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCategory {
    Transportation,
    Traffic,
    Housing,
    Population,
    Economic,
    Infrastructure,
    Environmental,
    Other(String),
}

impl EventCategory {
    pub fn as_str(&self) -> &str {
        match self {
            EventCategory::Transportation => "transportation",
            EventCategory::Traffic => "traffic",
            EventCategory::Housing => "housing",
            EventCategory::Population => "population",
            EventCategory::Economic => "economic",
            EventCategory::Infrastructure => "infrastructure",
            EventCategory::Environmental => "environmental",
            EventCategory::Other(raw) => raw,
        }
    }
}

impl From<String> for EventCategory {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "transportation" => EventCategory::Transportation,
            "traffic" => EventCategory::Traffic,
            "housing" => EventCategory::Housing,
            "population" => EventCategory::Population,
            "economic" => EventCategory::Economic,
            "infrastructure" => EventCategory::Infrastructure,
            "environmental" => EventCategory::Environmental,
            _ => EventCategory::Other(raw),
        }
    }
}

impl From<EventCategory> for String {
    fn from(category: EventCategory) -> Self {
        match category {
            EventCategory::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionComment {
    pub author: String,
    pub message: String,
    pub sentiment: Sentiment,
}

/// One event emitted by the backend during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationEvent {
    pub id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
    #[serde(rename = "type")]
    pub category: EventCategory,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Intensity in `[0, 1]`.
    #[serde(default)]
    pub severity: f64,
    /// Sentiment in `[-1, 1]`.
    #[serde(default)]
    pub positivity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub coordinates: GeoCoordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_metrics: Option<MetricsPatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<ReactionComment>,
}

impl SimulationEvent {
    /// Name of the zone the event belongs to. The backend fills both
    /// `zoneName` and `zoneId` with the zone name; either may be missing.
    pub fn owning_zone(&self) -> &str {
        if self.zone_name.is_empty() {
            &self.zone_id
        } else {
            &self.zone_name
        }
    }

    pub fn clamp_scalars(&mut self) {
        self.severity = clamp_or_zero(self.severity, 0.0, 1.0);
        self.positivity = clamp_or_zero(self.positivity, -1.0, 1.0);
    }
}

fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}
