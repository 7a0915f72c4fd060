use std::sync::Arc;

use core_sim::{
    marker_position, ChunkOutcome, SelectionConfig, SelectionEngine, SimulationSession,
    SimulationStatus, StartError,
};
use sim_geo::{Point, ZoneDirectory};
use sim_proto::{
    ConstituentMessage, DecodeStats, ReactionComment, Sentiment, SimulationEvent,
    SimulationRequest, StreamChunk,
};
use tracing::{info, warn};

/// What the network side reports back for a run.
#[derive(Debug)]
pub struct StreamMessage {
    pub run: u64,
    pub kind: StreamMessageKind,
}

#[derive(Debug)]
pub enum StreamMessageKind {
    Chunk(StreamChunk),
    Ended(DecodeStats),
    Failed(String),
    Reactions {
        event_id: String,
        messages: Vec<ConstituentMessage>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Applied,
    Dropped,
    /// Message from a run that was cancelled or replaced.
    Stale,
    Completed,
    /// The stream closed after the run had already finished.
    Closed,
    /// The stream closed before `complete` but chunks did arrive; the run
    /// stays loading until the user resets.
    EndedIncomplete,
    ResetAfterEmptyStream,
    ResetAfterFailure(String),
    CommentsAttached(bool),
}

/// Owns the session for the inspector and applies the recovery policy: a
/// run whose stream ends while loading with nothing received, or whose
/// transport fails, goes back to idle.
pub struct RunController {
    session: SimulationSession,
    directory: Arc<ZoneDirectory>,
    selection_config: Arc<SelectionConfig>,
    preset_zones: Vec<String>,
    run: u64,
}

impl RunController {
    pub fn new(directory: Arc<ZoneDirectory>, selection_config: Arc<SelectionConfig>) -> Self {
        Self {
            session: SimulationSession::new(),
            directory,
            selection_config,
            preset_zones: Vec::new(),
            run: 0,
        }
    }

    /// Zones selected at the start of every run. Returns unknown names.
    pub fn set_preset_zones(&mut self, zones: Vec<String>) -> Vec<String> {
        let unknown = SelectionEngine::replace_selection(
            &mut self.session,
            zones.iter().cloned(),
            &self.directory,
        );
        self.preset_zones = zones
            .into_iter()
            .filter(|zone| !unknown.contains(zone))
            .collect();
        unknown
    }

    /// Starts a new run, resetting any previous one first.
    pub fn start(&mut self, prompt: &str) -> Result<(u64, SimulationRequest), StartError> {
        if self.session.status() != SimulationStatus::Idle {
            self.session.reset();
        }
        if !self.preset_zones.is_empty() {
            SelectionEngine::replace_selection(
                &mut self.session,
                self.preset_zones.iter().cloned(),
                &self.directory,
            );
        }
        let request = self.session.start(prompt, &self.directory)?;
        self.run += 1;
        Ok((self.run, request))
    }

    pub fn current_run(&self) -> u64 {
        self.run
    }

    /// Abandons the active run and resets the session.
    pub fn reset(&mut self) {
        self.run += 1;
        self.session.reset();
    }

    pub fn handle(&mut self, message: StreamMessage) -> ControllerEvent {
        if message.run != self.run {
            return ControllerEvent::Stale;
        }
        match message.kind {
            StreamMessageKind::Chunk(chunk) => {
                let complete = chunk.is_complete();
                match self.session.apply_chunk(chunk) {
                    ChunkOutcome::Applied if complete => ControllerEvent::Completed,
                    ChunkOutcome::Applied => ControllerEvent::Applied,
                    ChunkOutcome::Dropped => ControllerEvent::Dropped,
                }
            }
            StreamMessageKind::Ended(stats) => {
                if !self.session.is_loading() {
                    return ControllerEvent::Closed;
                }
                if self.session.chunks_received() == 0 {
                    warn!(
                        target: "policy_sim::inspector",
                        frames = stats.frames,
                        malformed = stats.malformed,
                        "run.empty_stream_reset"
                    );
                    self.session.reset();
                    ControllerEvent::ResetAfterEmptyStream
                } else {
                    warn!(
                        target: "policy_sim::inspector",
                        chunks = self.session.chunks_received(),
                        "run.ended_without_complete"
                    );
                    ControllerEvent::EndedIncomplete
                }
            }
            StreamMessageKind::Failed(reason) => {
                warn!(target: "policy_sim::inspector", error = %reason, "run.transport_failed");
                self.session.reset();
                ControllerEvent::ResetAfterFailure(reason)
            }
            StreamMessageKind::Reactions { event_id, messages } => {
                let comments = self
                    .session
                    .event(&event_id)
                    .map(|event| constituent_comments(event, messages))
                    .unwrap_or_default();
                let attached = self.session.attach_comments(&event_id, comments);
                info!(
                    target: "policy_sim::inspector",
                    event = %event_id,
                    attached,
                    "run.reactions_attached"
                );
                ControllerEvent::CommentsAttached(attached)
            }
        }
    }

    /// Moves focus `step` events forward (negative for backward), wrapping.
    pub fn focus_step(&mut self, step: isize) -> bool {
        let count = self.session.events().len();
        if count == 0 {
            return false;
        }
        let current = self
            .session
            .focused_id()
            .and_then(|id| self.session.events().iter().position(|e| e.id == id));
        let next = match current {
            Some(idx) => (idx as isize + step).rem_euclid(count as isize) as usize,
            None if step < 0 => count - 1,
            None => 0,
        };
        let id = self.session.events()[next].id.clone();
        self.session.focus_event(Some(&id))
    }

    pub fn clear_focus(&mut self) {
        self.session.focus_event(None);
    }

    pub fn session(&self) -> &SimulationSession {
        &self.session
    }

    pub fn directory(&self) -> &ZoneDirectory {
        &self.directory
    }

    pub fn focused_marker(&self) -> Option<Point> {
        let event = self.session.focused_event()?;
        Some(marker_position(
            event,
            &self.directory,
            self.selection_config.marker_snap_epsilon,
        ))
    }
}

fn constituent_comments(
    event: &SimulationEvent,
    messages: Vec<ConstituentMessage>,
) -> Vec<ReactionComment> {
    let sentiment = if event.positivity > 0.2 {
        Sentiment::Positive
    } else if event.positivity < -0.2 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };
    messages
        .into_iter()
        .map(|message| ReactionComment {
            author: message.name,
            message: message.message,
            sentiment,
        })
        .collect()
}
