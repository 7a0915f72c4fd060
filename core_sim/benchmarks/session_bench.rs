use core_sim::SimulationSession;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use serde_json::json;
use sim_geo::{Point, Zone, ZoneDirectory, ZoneGeometry};
use sim_proto::StreamChunk;

fn directory(zones: usize) -> ZoneDirectory {
    ZoneDirectory::from_zones((0..zones).map(|idx| {
        let x = idx as f64;
        let ring = vec![
            Point::new(x, 0.0),
            Point::new(x + 1.0, 0.0),
            Point::new(x + 1.0, 1.0),
            Point::new(x, 1.0),
        ];
        let props = json!({ "population": 1000 + idx, "median_income": 50000 });
        Zone::new(format!("zone-{idx}"), ZoneGeometry::Polygon(vec![ring]))
            .with_properties(props.as_object().cloned().unwrap_or_default())
    }))
}

fn events(count: usize, zones: usize) -> Vec<StreamChunk> {
    (0..count)
        .map(|idx| {
            let zone = format!("zone-{}", idx % zones);
            StreamChunk::Event(
                serde_json::from_value(json!({
                    "id": format!("e{idx}"),
                    "zoneName": zone,
                    "type": "economic",
                    "coordinates": [0.5, idx as f64 % zones as f64 + 0.5],
                    "metrics": {
                        "zoneName": zone,
                        "population": 1200,
                        "median_income_change": 250
                    },
                    "cityMetrics": { "averageIncome": 51000 }
                }))
                .expect("bench event"),
            )
        })
        .collect()
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_apply");
    let dir = directory(64);
    for count in [100usize, 1_000] {
        let chunks = events(count, 64);
        group.bench_with_input(BenchmarkId::new("events", count), &chunks, |b, chunks| {
            b.iter_batched(
                || {
                    let mut session = SimulationSession::new();
                    session.start("bench", &dir).expect("start");
                    (session, chunks.clone())
                },
                |(mut session, chunks)| {
                    for chunk in chunks {
                        session.apply_chunk(chunk);
                    }
                    session
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(session_benches, bench_apply);
criterion_main!(session_benches);
