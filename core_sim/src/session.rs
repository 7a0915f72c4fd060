//! Client-side state of one simulation run.
//!
//! ```text
//! idle --start--> loading --complete chunk--> complete
//!   ^                |                            |
//!   +-----reset------+------------reset-----------+
//! ```
//!
//! Chunks are only applied while `loading`; anything else is dropped without
//! touching state.

use serde::Serialize;
use serde_json::{Map, Value};
use sim_geo::ZoneDirectory;
use sim_proto::{
    NeighborhoodContext, ReactionComment, SimulationEvent, SimulationRequest, StreamChunk,
};
use thiserror::Error;

use crate::metrics::{AggregateMetrics, MetricScope};
use crate::selection::SelectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    #[default]
    Idle,
    Loading,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a run can only start from idle (status is {0:?})")]
    NotIdle(SimulationStatus),
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("zone directory is empty")]
    EmptyDirectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Applied,
    /// Out of phase; state untouched.
    Dropped,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationSession {
    status: SimulationStatus,
    prompt: String,
    events: Vec<SimulationEvent>,
    focused: Option<String>,
    selection: SelectionSet,
    metrics: AggregateMetrics,
    summary: Option<String>,
    zones_analyzing: Option<u32>,
    progress_message: Option<String>,
    chunks_received: usize,
}

impl SimulationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `idle -> loading` and returns the request body for the run.
    ///
    /// The selection is kept; it decides which zones the request names. An
    /// empty selection names every zone in the directory.
    pub fn start(
        &mut self,
        prompt: &str,
        directory: &ZoneDirectory,
    ) -> Result<SimulationRequest, StartError> {
        if self.status != SimulationStatus::Idle {
            return Err(StartError::NotIdle(self.status));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StartError::EmptyPrompt);
        }
        if directory.is_empty() {
            return Err(StartError::EmptyDirectory);
        }

        self.status = SimulationStatus::Loading;
        self.prompt = prompt.to_string();
        self.events.clear();
        self.focused = None;
        self.metrics = AggregateMetrics::from_directory(directory);
        self.summary = None;
        self.zones_analyzing = None;
        self.progress_message = None;
        self.chunks_received = 0;

        let selected_zones = self.resolved_zone_names(directory);
        let zones: Vec<_> = selected_zones
            .iter()
            .filter_map(|name| directory.lookup(name))
            .collect();
        let neighborhood_properties: Vec<Map<String, Value>> = zones
            .iter()
            .filter(|zone| !zone.properties.is_empty())
            .map(|zone| zone.properties.clone())
            .collect();
        let neighborhood_context: Vec<NeighborhoodContext> = zones
            .iter()
            .map(|zone| NeighborhoodContext::from_properties(&zone.name, &zone.properties))
            .collect();

        tracing::info!(
            target: "policy_sim::session",
            zones = selected_zones.len(),
            explicit_selection = !self.selection.is_empty(),
            described = neighborhood_context.iter().filter(|c| !c.is_bare()).count(),
            "session.started"
        );

        Ok(SimulationRequest {
            prompt: self.prompt.clone(),
            selected_zones,
            neighborhood_properties,
            neighborhood_context,
        })
    }

    /// Zone names a run would target: the selection, or every zone when
    /// nothing is selected.
    pub fn resolved_zone_names(&self, directory: &ZoneDirectory) -> Vec<String> {
        if self.selection.is_empty() {
            directory.names().map(str::to_string).collect()
        } else {
            self.selection.to_vec()
        }
    }

    pub fn apply_chunk(&mut self, chunk: StreamChunk) -> ChunkOutcome {
        if self.status != SimulationStatus::Loading {
            tracing::debug!(
                target: "policy_sim::session",
                kind = chunk.kind(),
                status = ?self.status,
                "session.chunk_dropped"
            );
            return ChunkOutcome::Dropped;
        }
        self.chunks_received += 1;

        match chunk {
            StreamChunk::Event(event) => self.push_event(event),
            StreamChunk::Update(update) => {
                if update.zones_count.is_some() {
                    self.zones_analyzing = update.zones_count;
                }
                if !update.message.is_empty() {
                    self.progress_message = Some(update.message);
                }
            }
            StreamChunk::Complete(done) => {
                self.summary = Some(done.summary);
                self.status = SimulationStatus::Complete;
                self.selection.clear();
                tracing::info!(
                    target: "policy_sim::session",
                    events = self.events.len(),
                    chunks = self.chunks_received,
                    "session.completed"
                );
            }
        }
        ChunkOutcome::Applied
    }

    fn push_event(&mut self, event: SimulationEvent) {
        if let Some(patch) = &event.metrics {
            let zone = patch.zone().unwrap_or(event.owning_zone());
            if !zone.is_empty() {
                self.metrics
                    .merge(MetricScope::zone(zone), &patch.samples());
            }
        }
        if let Some(patch) = &event.city_metrics {
            self.metrics.merge(MetricScope::CityWide, &patch.samples());
        }
        tracing::debug!(
            target: "policy_sim::session",
            id = %event.id,
            zone = %event.owning_zone(),
            category = %event.category,
            "session.event_applied"
        );
        self.events.push(event);
    }

    /// Focuses a known event (clearing the selection) or clears focus with
    /// `None`. Unknown ids change nothing and return `false`.
    pub fn focus_event(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.focused = None;
                true
            }
            Some(id) if self.event(id).is_some() => {
                self.focused = Some(id.to_string());
                self.selection.clear();
                true
            }
            Some(id) => {
                tracing::debug!(
                    target: "policy_sim::session",
                    id,
                    "session.focus_unknown_event"
                );
                false
            }
        }
    }

    /// Replaces the comments of an existing event. The only mutation an
    /// applied event ever sees.
    pub fn attach_comments(&mut self, event_id: &str, comments: Vec<ReactionComment>) -> bool {
        match self.events.iter_mut().find(|event| event.id == event_id) {
            Some(event) => {
                event.comments = comments;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        if self.status != SimulationStatus::Idle {
            tracing::info!(
                target: "policy_sim::session",
                from = ?self.status,
                "session.reset"
            );
        }
        *self = Self::default();
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == SimulationStatus::Loading
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&SimulationEvent> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn focused_event(&self) -> Option<&SimulationEvent> {
        self.focused.as_deref().and_then(|id| self.event(id))
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn metrics(&self) -> &AggregateMetrics {
        &self.metrics
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn zones_analyzing(&self) -> Option<u32> {
        self.zones_analyzing
    }

    pub fn progress_message(&self) -> Option<&str> {
        self.progress_message.as_deref()
    }

    /// Chunks applied since the last start.
    pub fn chunks_received(&self) -> usize {
        self.chunks_received
    }
}
