//! Pointer and keyboard gestures resolved into selection changes.
//!
//! A press without the modifier is a click candidate; it counts as a click
//! only if released quickly and close to where it started. A press with the
//! modifier starts a rectangle drag that adds every zone whose centroid lies
//! inside the rectangle when the pointer is released. Releasing the modifier
//! or pressing escape mid-drag cancels it.

use std::sync::Arc;
use std::time::Duration;

use sim_geo::{BoundingBox, Point, ZoneDirectory};

use crate::selection_config::SelectionConfig;
use crate::session::SimulationSession;

/// Position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPos) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Where the pointer is, in both screen and zone coordinates, and when.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub screen: ScreenPos,
    pub geo: Point,
    /// Monotonic timestamp supplied by the caller.
    pub at: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureInput {
    PointerDown { sample: PointerSample, modifier: bool },
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    ModifierReleased,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    EventFocused,
    Loading,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Ignored,
    Pressed,
    /// Released too late or too far away to be a click.
    NotAClick,
    Toggled { zone: String, selected: bool },
    Cleared,
    DragStarted,
    DragUpdated,
    /// Names newly added by the drag, in directory order.
    DragCommitted { added: Vec<String> },
    DragTooSmall,
    DragCancelled,
    Blocked(BlockReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum GestureState {
    #[default]
    Idle,
    Pressed(PointerSample),
    Dragging {
        start: PointerSample,
        current: PointerSample,
    },
}

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    config: Arc<SelectionConfig>,
    state: GestureState,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(Arc::new(SelectionConfig::default()))
    }
}

impl SelectionEngine {
    pub fn new(config: Arc<SelectionConfig>) -> Self {
        Self {
            config,
            state: GestureState::Idle,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Current drag rectangle in zone coordinates.
    pub fn drag_bounds(&self) -> Option<BoundingBox> {
        match self.state {
            GestureState::Dragging { start, current } => {
                Some(BoundingBox::from_corners(start.geo, current.geo))
            }
            _ => None,
        }
    }

    pub fn handle(
        &mut self,
        input: GestureInput,
        directory: &ZoneDirectory,
        session: &mut SimulationSession,
    ) -> GestureOutcome {
        let outcome = match (self.state, input) {
            (_, GestureInput::PointerDown { sample, modifier }) => {
                if modifier {
                    self.state = GestureState::Dragging {
                        start: sample,
                        current: sample,
                    };
                    GestureOutcome::DragStarted
                } else {
                    self.state = GestureState::Pressed(sample);
                    GestureOutcome::Pressed
                }
            }
            (GestureState::Dragging { start, .. }, GestureInput::PointerMove(sample)) => {
                self.state = GestureState::Dragging {
                    start,
                    current: sample,
                };
                GestureOutcome::DragUpdated
            }
            (GestureState::Dragging { start, .. }, GestureInput::PointerUp(sample)) => {
                self.state = GestureState::Idle;
                self.commit_drag(start, sample, directory, session)
            }
            (GestureState::Pressed(down), GestureInput::PointerUp(up)) => {
                self.state = GestureState::Idle;
                self.click(down, up, directory, session)
            }
            (
                GestureState::Dragging { .. },
                GestureInput::ModifierReleased | GestureInput::Escape,
            ) => {
                self.state = GestureState::Idle;
                GestureOutcome::DragCancelled
            }
            (GestureState::Pressed(_), GestureInput::Escape) => {
                self.state = GestureState::Idle;
                GestureOutcome::Ignored
            }
            _ => GestureOutcome::Ignored,
        };

        if !matches!(
            outcome,
            GestureOutcome::Ignored | GestureOutcome::Pressed | GestureOutcome::DragUpdated
        ) {
            tracing::debug!(
                target: "policy_sim::selection",
                outcome = ?outcome,
                selected = session.selection().len(),
                "gesture.resolved"
            );
        }
        outcome
    }

    fn is_click(&self, down: PointerSample, up: PointerSample) -> bool {
        let elapsed = up.at.saturating_sub(down.at);
        elapsed < self.config.click_max_duration()
            && down.screen.distance(up.screen) <= self.config.click_max_distance_px
    }

    fn click(
        &self,
        down: PointerSample,
        up: PointerSample,
        directory: &ZoneDirectory,
        session: &mut SimulationSession,
    ) -> GestureOutcome {
        if !self.is_click(down, up) {
            return GestureOutcome::NotAClick;
        }
        let Some(zone) = directory.zone_at(up.geo) else {
            session.selection_mut().clear();
            return GestureOutcome::Cleared;
        };
        if let Some(reason) = block_reason(session) {
            return GestureOutcome::Blocked(reason);
        }
        let selected = session.selection_mut().toggle(&zone.name);
        GestureOutcome::Toggled {
            zone: zone.name.clone(),
            selected,
        }
    }

    fn commit_drag(
        &self,
        start: PointerSample,
        end: PointerSample,
        directory: &ZoneDirectory,
        session: &mut SimulationSession,
    ) -> GestureOutcome {
        if start.screen.distance(end.screen) < self.config.drag_min_size_px {
            return GestureOutcome::DragTooSmall;
        }
        if let Some(reason) = block_reason(session) {
            return GestureOutcome::Blocked(reason);
        }
        let bounds = BoundingBox::from_corners(start.geo, end.geo);
        let selection = session.selection_mut();
        let added = directory
            .zones_with_centroid_in(&bounds)
            .into_iter()
            .filter(|zone| selection.insert(zone.name.as_str()))
            .map(|zone| zone.name.clone())
            .collect();
        GestureOutcome::DragCommitted { added }
    }

    /// Replaces the selection with the known names among `names`. Returns the
    /// names that were rejected as unknown.
    pub fn replace_selection<I, S>(
        session: &mut SimulationSession,
        names: I,
        directory: &ZoneDirectory,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (known, unknown): (Vec<String>, Vec<String>) = names
            .into_iter()
            .map(Into::into)
            .partition(|name| directory.contains_name(name));
        for name in &unknown {
            tracing::warn!(
                target: "policy_sim::selection",
                zone = %name,
                "selection.unknown_zone"
            );
        }
        session.selection_mut().replace(known);
        unknown
    }

    pub fn clear_selection(session: &mut SimulationSession) {
        session.selection_mut().clear();
    }
}

fn block_reason(session: &SimulationSession) -> Option<BlockReason> {
    if session.focused_id().is_some() {
        Some(BlockReason::EventFocused)
    } else if session.is_loading() {
        Some(BlockReason::Loading)
    } else {
        None
    }
}
