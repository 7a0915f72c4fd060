mod common;

use std::io;

use bytes::Bytes;
use core_sim::{marker_position, MetricScope, SimulationSession, SimulationStatus};
use futures::stream;
use sim_client::{ChunkStream, ClientError};
use sim_proto::StreamChunk;

type Read = Result<Bytes, io::Error>;

fn reads<I, S>(parts: I) -> futures::stream::Iter<std::vec::IntoIter<Read>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let owned: Vec<Read> = parts
        .into_iter()
        .map(|part| Ok(Bytes::copy_from_slice(part.as_ref())))
        .collect();
    stream::iter(owned)
}

/// Applies every chunk of `chunks` to `session`, stopping at the first error.
async fn drive<S>(
    chunks: &mut ChunkStream<S>,
    session: &mut SimulationSession,
) -> anyhow::Result<Vec<&'static str>>
where
    S: futures::Stream<Item = Read> + Unpin,
{
    let mut kinds = Vec::new();
    while let Some(chunk) = chunks.next_chunk().await {
        let chunk = chunk?;
        kinds.push(chunk.kind());
        session.apply_chunk(chunk);
    }
    Ok(kinds)
}

#[tokio::test]
async fn frame_split_across_reads_reaches_the_session_intact() -> anyhow::Result<()> {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    session.start("Upzone the waterfront", &directory)?;

    let first = format!(
        "{}data: {{\"typ",
        common::event_frame("e1", "Harbor", 0.5, 0.5, r#"{"population":1100,"medianRent":1650}"#)
    );
    let second = "e\":\"complete\",\"data\":{\"summary\":\"done\"}}\n\n";
    let mut chunks = ChunkStream::new(reads([first.as_str(), second]), None);

    let kinds = drive(&mut chunks, &mut session).await?;
    assert_eq!(kinds, vec!["event", "complete"]);
    assert_eq!(session.status(), SimulationStatus::Complete);
    assert_eq!(session.summary(), Some("done"));
    assert_eq!(session.events().len(), 1);

    let harbor = MetricScope::zone("Harbor");
    let population = session.metrics().get(&harbor, "population").expect("population");
    assert_eq!(population.value, Some(1100.0));
    assert_eq!(population.delta, Some(100.0));
    let rent = session.metrics().get(&harbor, "medianRent").expect("rent");
    assert_eq!(rent.delta, Some(150.0));
    Ok(())
}

#[tokio::test]
async fn every_split_point_yields_the_same_run() -> anyhow::Result<()> {
    let directory = common::directory();
    let body = [
        common::update_frame("Analyzing zones \u{2026} caf\u{e9}", 3),
        common::event_frame("e1", "Harbor", 0.5, 0.5, r#"{"population":1200}"#),
        common::event_frame("e2", "Midtown", 0.5, 2.5, r#"{"population_change":-40}"#),
        common::complete_frame("Rents rose slightly"),
    ]
    .concat();
    let bytes = body.as_bytes();

    let mut reference = SimulationSession::new();
    reference.start("prompt", &directory)?;
    let mut whole = ChunkStream::new(reads([bytes]), None);
    let expected = drive(&mut whole, &mut reference).await?;
    assert_eq!(expected, vec!["update", "event", "event", "complete"]);

    for split in 1..bytes.len() {
        let mut session = SimulationSession::new();
        session.start("prompt", &directory)?;
        let mut chunks = ChunkStream::new(reads([&bytes[..split], &bytes[split..]]), None);
        let kinds = drive(&mut chunks, &mut session).await?;
        assert_eq!(kinds, expected, "split at byte {split}");
        assert_eq!(session.events(), reference.events(), "split at byte {split}");
        assert_eq!(session.progress_message(), reference.progress_message());
        assert_eq!(session.metrics(), reference.metrics());
    }
    Ok(())
}

#[tokio::test]
async fn chunks_after_complete_never_reach_the_session() -> anyhow::Result<()> {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    session.start("prompt", &directory)?;
    let body = [
        common::event_frame("e1", "Harbor", 0.5, 0.5, "{}"),
        common::complete_frame("ok"),
        common::event_frame("late", "Harbor", 0.5, 0.5, "{}"),
    ]
    .concat();

    let mut chunks = ChunkStream::new(reads([body]), None);
    let kinds = drive(&mut chunks, &mut session).await?;
    assert_eq!(kinds, vec!["event", "complete"]);
    assert_eq!(chunks.stats().after_complete, 1);
    assert!(session.event("late").is_none());
    Ok(())
}

#[tokio::test]
async fn phases_are_enforced_on_a_finished_session() -> anyhow::Result<()> {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    session.start("prompt", &directory)?;
    let first = [
        common::event_frame("e1", "Harbor", 0.5, 0.5, "{}"),
        common::complete_frame("ok"),
    ]
    .concat();
    drive(&mut ChunkStream::new(reads([first]), None), &mut session).await?;

    // A second stream replayed into a completed session changes nothing.
    let replay = common::event_frame("e2", "Midtown", 0.5, 2.5, "{}");
    drive(&mut ChunkStream::new(reads([replay]), None), &mut session).await?;
    assert_eq!(session.events().len(), 1);
    assert_eq!(session.status(), SimulationStatus::Complete);
    assert!(session.start("again", &directory).is_err());

    session.reset();
    assert_eq!(session.status(), SimulationStatus::Idle);
    assert!(session.start("again", &directory).is_ok());
    Ok(())
}

#[tokio::test]
async fn transport_failure_keeps_applied_events_until_reset() {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    session.start("prompt", &directory).expect("start");
    let parts: Vec<Read> = vec![
        Ok(Bytes::from(common::event_frame("e1", "Harbor", 0.5, 0.5, "{}"))),
        Err(io::Error::new(io::ErrorKind::ConnectionAborted, "gone")),
    ];
    let mut chunks = ChunkStream::new(stream::iter(parts), None);

    let mut failure = None;
    while let Some(item) = chunks.next_chunk().await {
        match item {
            Ok(chunk) => {
                session.apply_chunk(chunk);
            }
            Err(err) => failure = Some(err),
        }
    }
    let failure = failure.expect("transport error surfaces");
    assert!(matches!(failure, ClientError::Io(_)));
    assert!(failure.is_transport());
    assert!(session.is_loading());
    assert_eq!(session.events().len(), 1);
}

#[tokio::test]
async fn markers_land_inside_their_zone() -> anyhow::Result<()> {
    let directory = common::directory();
    let mut session = SimulationSession::new();
    session.start("prompt", &directory)?;
    // Midtown event reported at Harbor's position.
    let body = common::event_frame("stray", "Midtown", 0.5, 0.5, "{}");
    let mut chunks = ChunkStream::new(reads([body]), None);
    while let Some(chunk) = chunks.next_chunk().await {
        if let StreamChunk::Event(event) = chunk? {
            let marker = marker_position(&event, &directory, 1e-5);
            let midtown = directory.lookup("Midtown").expect("zone");
            assert!(midtown.contains(marker), "marker {marker:?} outside Midtown");
        }
    }
    Ok(())
}
