//! Partial metric objects attached to events.
//!
//! The backend sends any subset of a zone's property fields, sometimes nested
//! (`{"derived": {"density_index": 2.1}}`), and pairs a field with its delta
//! through a `Change`/`_change` suffix (`populationChange`,
//! `median_income_change`). [`MetricsPatch::samples`] flattens all of that into
//! one `(field, value?, delta?)` record per base field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub field: String,
    pub value: Option<f64>,
    pub delta: Option<f64>,
}

impl MetricsPatch {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Zone named by the patch itself, if any.
    pub fn zone(&self) -> Option<&str> {
        self.zone_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.zone_id.as_deref().filter(|id| !id.is_empty()))
    }

    /// One sample per base field, sorted by field name.
    pub fn samples(&self) -> Vec<MetricSample> {
        let mut samples: BTreeMap<String, MetricSample> = BTreeMap::new();
        for (key, number) in numeric_fields(&self.fields) {
            let (field, is_delta) = match delta_base(&key) {
                Some(base) => (base.to_string(), true),
                None => (key, false),
            };
            let sample = samples.entry(field.clone()).or_insert(MetricSample {
                field,
                value: None,
                delta: None,
            });
            if is_delta {
                sample.delta = Some(number);
            } else {
                sample.value = Some(number);
            }
        }
        samples.into_values().collect()
    }
}

/// Numeric leaves of a JSON object keyed by dotted path. Nulls, strings and
/// arrays are skipped.
pub fn numeric_fields(map: &Map<String, Value>) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    collect_numeric("", map, &mut out);
    out
}

fn collect_numeric(prefix: &str, map: &Map<String, Value>, out: &mut BTreeMap<String, f64>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Number(number) => {
                if let Some(number) = number.as_f64() {
                    out.insert(path, number);
                }
            }
            Value::Object(nested) => collect_numeric(&path, nested, out),
            _ => {}
        }
    }
}

fn delta_base(key: &str) -> Option<&str> {
    key.strip_suffix("_change")
        .or_else(|| key.strip_suffix("Change"))
        .filter(|base| !base.is_empty() && !base.ends_with('.'))
}
