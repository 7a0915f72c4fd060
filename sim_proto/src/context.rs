//! Per-zone narrative context sent alongside a simulate request.
//!
//! Zone property bags come from arbitrary GeoJSON, so the fields are read
//! leniently: snake_case or camelCase keys, and list fields accept either a
//! single string or an array of strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodContext {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub current_events: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighboring_neighborhoods: Vec<String>,
}

const BASELINE_KEYS: &[&str] = &["baseline_description", "baselineDescription", "description"];
const EVENT_KEYS: &[&str] = &["current_events", "currentEvents"];
const NEIGHBOR_KEYS: &[&str] = &[
    "neighboring_neighborhoods",
    "neighboringNeighborhoods",
    "neighbors",
];

impl NeighborhoodContext {
    /// Context for zone `name` read from its property bag. Missing or
    /// non-string entries are left empty.
    pub fn from_properties(name: &str, properties: &Map<String, Value>) -> Self {
        let baseline_description = first_present(properties, BASELINE_KEYS)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Self {
            name: name.to_string(),
            baseline_description,
            current_events: string_list(first_present(properties, EVENT_KEYS)),
            neighboring_neighborhoods: string_list(first_present(properties, NEIGHBOR_KEYS)),
        }
    }

    /// True when nothing beyond the name is known.
    pub fn is_bare(&self) -> bool {
        self.baseline_description.is_none()
            && self.current_events.is_empty()
            && self.neighboring_neighborhoods.is_empty()
    }
}

fn first_present<'a>(properties: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| properties.get(*key))
        .find(|value| !value.is_null())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let entries: Vec<&str> = match value {
        Some(Value::String(text)) => vec![text.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
