mod common;

use core_sim::{
    BlockReason, GestureInput, GestureOutcome, SelectionEngine, SimulationSession,
    SimulationStatus,
};
use sim_geo::{point_in_polygon, Point, ZoneDirectory};
use sim_proto::{CompleteData, StreamChunk};

fn click(
    engine: &mut SelectionEngine,
    directory: &ZoneDirectory,
    session: &mut SimulationSession,
    x: f64,
    y: f64,
) -> GestureOutcome {
    engine.handle(
        GestureInput::PointerDown {
            sample: common::sample(x, y, 10_000),
            modifier: false,
        },
        directory,
        session,
    );
    engine.handle(
        GestureInput::PointerUp(common::sample(x, y, 10_080)),
        directory,
        session,
    )
}

fn drag(
    engine: &mut SelectionEngine,
    directory: &ZoneDirectory,
    session: &mut SimulationSession,
    from: (f64, f64),
    to: (f64, f64),
) -> GestureOutcome {
    engine.handle(
        GestureInput::PointerDown {
            sample: common::sample(from.0, from.1, 0),
            modifier: true,
        },
        directory,
        session,
    );
    engine.handle(
        GestureInput::PointerMove(common::sample(to.0, to.1, 300)),
        directory,
        session,
    );
    engine.handle(
        GestureInput::PointerUp(common::sample(to.0, to.1, 600)),
        directory,
        session,
    )
}

/// A completed run holding one event in Harbor, focused.
fn focused_session(directory: &ZoneDirectory) -> SimulationSession {
    let mut session = SimulationSession::new();
    session.start("prompt", directory).expect("start");
    let event = serde_json::from_value(serde_json::json!({
        "id": "e1",
        "zoneName": "Harbor",
        "type": "economic",
        "coordinates": [0.5, 0.5]
    }))
    .expect("event parses");
    session.apply_chunk(StreamChunk::Event(event));
    session.apply_chunk(StreamChunk::Complete(CompleteData::default()));
    assert!(session.focus_event(Some("e1")));
    session
}

#[test]
fn drag_selects_by_centroid_not_overlap() {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    let mut engine = SelectionEngine::default();

    // Covers Harbor's centroid and clips the bottom of Uplands.
    let outcome = drag(&mut engine, &directory, &mut session, (-0.5, -0.5), (1.5, 2.5));
    assert_eq!(
        outcome,
        GestureOutcome::DragCommitted {
            added: vec!["Harbor".into()]
        }
    );
    assert_eq!(session.selection().to_vec(), vec!["Harbor"]);
}

#[test]
fn focused_event_blocks_zone_toggle() {
    let directory = common::directory();
    let mut session = focused_session(&directory);
    let mut engine = SelectionEngine::default();
    let before = session.selection().to_vec();

    let outcome = click(&mut engine, &directory, &mut session, 2.5, 0.5);
    assert_eq!(outcome, GestureOutcome::Blocked(BlockReason::EventFocused));
    assert_eq!(session.selection().to_vec(), before);

    session.focus_event(None);
    let outcome = click(&mut engine, &directory, &mut session, 2.5, 0.5);
    assert_eq!(
        outcome,
        GestureOutcome::Toggled {
            zone: "Midtown".into(),
            selected: true
        }
    );
}

#[test]
fn focused_event_blocks_drag_commit() {
    let directory = common::directory();
    let mut session = focused_session(&directory);
    let mut engine = SelectionEngine::default();
    let outcome = drag(&mut engine, &directory, &mut session, (-0.5, -0.5), (3.5, 1.5));
    assert_eq!(outcome, GestureOutcome::Blocked(BlockReason::EventFocused));
    assert!(session.selection().is_empty());
    assert!(!engine.is_dragging());
}

#[test]
fn selection_is_frozen_while_loading() {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    let mut engine = SelectionEngine::default();
    click(&mut engine, &directory, &mut session, 0.5, 0.5);
    let request = session.start("prompt", &directory).expect("start");
    assert_eq!(request.selected_zones, vec!["Harbor"]);
    assert_eq!(session.status(), SimulationStatus::Loading);

    let outcome = click(&mut engine, &directory, &mut session, 2.5, 0.5);
    assert_eq!(outcome, GestureOutcome::Blocked(BlockReason::Loading));
    assert_eq!(session.selection().to_vec(), vec!["Harbor"]);
}

#[test]
fn empty_selection_requests_every_zone_with_properties() {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    let request = session.start("prompt", &directory).expect("start");
    assert_eq!(request.selected_zones, vec!["Harbor", "Midtown", "Uplands"]);
    assert_eq!(request.neighborhood_properties.len(), 3);
    assert_eq!(request.neighborhood_context.len(), 3);
    assert_eq!(request.neighborhood_context[0].name, "Harbor");
}

#[test]
fn on_edge_and_outside_points_snap_inside() {
    let directory = common::directory();
    let harbor = directory.lookup("Harbor").expect("zone");
    let on_edge = Point::new(1.0, 0.5);

    let snapped = directory.snap_coordinate_into_zone(on_edge, "Harbor", 1e-5);
    assert!(harbor.contains(snapped), "{snapped:?}");
    assert_ne!(snapped, on_edge);

    let outside = Point::new(1.3, 0.5);
    assert!(!harbor.contains(outside));
    let snapped = directory.snap_coordinate_into_zone(outside, "Harbor", 1e-5);
    assert!(harbor.contains(snapped));
    assert!(snapped.x < 1.0);
    assert!(point_in_polygon(snapped, &[vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ]]));
}
