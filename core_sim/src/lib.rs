//! Client-side core of the policy simulation.
//!
//! [`SimulationSession`] owns everything a run mutates: status, the ordered
//! event list, the focused event, the zone selection and aggregate metrics.
//! [`SelectionEngine`] turns raw pointer gestures into selection changes
//! against a shared [`sim_geo::ZoneDirectory`].

mod gestures;
mod markers;
pub mod metrics;
mod selection;
pub mod selection_config;
mod session;

pub use gestures::{
    BlockReason, GestureInput, GestureOutcome, PointerSample, ScreenPos, SelectionEngine,
};
pub use markers::{coordinate_to_point, marker_position};
pub use metrics::{AggregateMetrics, MetricScope, MetricTable, MetricValue};
pub use selection::SelectionSet;
pub use selection_config::{load_selection_config_from_env, SelectionConfig, SelectionConfigError};
pub use session::{ChunkOutcome, SimulationSession, SimulationStatus, StartError};
