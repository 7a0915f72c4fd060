use std::collections::BTreeMap;

use serde::Serialize;
use sim_geo::ZoneDirectory;
use sim_proto::{numeric_fields, MetricSample};

/// Key of one metric table: the whole city or a single zone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MetricScope {
    CityWide,
    Zone(String),
}

impl MetricScope {
    pub fn zone(name: impl Into<String>) -> Self {
        MetricScope::Zone(name.into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValue {
    pub value: Option<f64>,
    pub delta: Option<f64>,
}

pub type MetricTable = BTreeMap<String, MetricValue>;

/// Per-scope metric tables, updated incrementally from event patches.
///
/// Each field is last-write-wins, but only for the parts a sample actually
/// carries: a missing value or delta never overwrites a known one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateMetrics {
    tables: BTreeMap<MetricScope, MetricTable>,
    baselines: BTreeMap<MetricScope, BTreeMap<String, f64>>,
}

impl AggregateMetrics {
    /// Seeds one table per zone from its numeric properties, plus an empty
    /// city-wide table.
    pub fn from_directory(directory: &ZoneDirectory) -> Self {
        let mut metrics = Self::default();
        metrics.tables.insert(MetricScope::CityWide, MetricTable::new());
        for zone in directory.all() {
            let scope = MetricScope::zone(zone.name.as_str());
            let baseline = numeric_fields(&zone.properties);
            let table = baseline
                .iter()
                .map(|(field, &value)| {
                    (
                        field.clone(),
                        MetricValue {
                            value: Some(value),
                            delta: None,
                        },
                    )
                })
                .collect();
            metrics.tables.insert(scope.clone(), table);
            metrics.baselines.insert(scope, baseline);
        }
        metrics
    }

    /// Applies samples to one scope and returns how many fields changed.
    ///
    /// A value arriving without its own delta gets `value - baseline` when the
    /// field has a baseline.
    pub fn merge(&mut self, scope: MetricScope, samples: &[MetricSample]) -> usize {
        let baseline = self.baselines.get(&scope);
        let mut derived = Vec::with_capacity(samples.len());
        for sample in samples {
            let delta = sample.delta.or_else(|| {
                let value = sample.value?;
                baseline
                    .and_then(|fields| fields.get(&sample.field))
                    .map(|base| value - base)
            });
            derived.push((sample.field.as_str(), sample.value, delta));
        }

        let table = self.tables.entry(scope).or_default();
        let mut changed = 0;
        for (field, value, delta) in derived {
            if value.is_none() && delta.is_none() {
                continue;
            }
            let entry = table.entry(field.to_string()).or_default();
            let merged = MetricValue {
                value: value.or(entry.value),
                delta: delta.or(entry.delta),
            };
            if merged != *entry {
                *entry = merged;
                changed += 1;
            }
        }
        changed
    }

    pub fn get(&self, scope: &MetricScope, field: &str) -> Option<MetricValue> {
        self.tables.get(scope)?.get(field).copied()
    }

    pub fn table(&self, scope: &MetricScope) -> Option<&MetricTable> {
        self.tables.get(scope)
    }

    pub fn city(&self) -> Option<&MetricTable> {
        self.table(&MetricScope::CityWide)
    }

    pub fn baseline(&self, scope: &MetricScope, field: &str) -> Option<f64> {
        self.baselines.get(scope)?.get(field).copied()
    }

    pub fn scopes(&self) -> impl Iterator<Item = (&MetricScope, &MetricTable)> + '_ {
        self.tables.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
