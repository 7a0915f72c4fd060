use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sim_geo::{snap_into_geometry, BoundingBox, Point, Zone, ZoneDirectory, ZoneGeometry};

fn ring(center: Point, radius: f64, vertices: usize) -> Vec<Point> {
    (0..vertices)
        .map(|i| {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

fn grid_directory(side: usize) -> ZoneDirectory {
    let zones = (0..side * side).map(|idx| {
        let center = Point::new((idx % side) as f64, (idx / side) as f64);
        Zone::new(
            format!("zone-{idx}"),
            ZoneGeometry::Polygon(vec![ring(center, 0.45, 24)]),
        )
    });
    ZoneDirectory::from_zones(zones)
}

fn bench_snap(c: &mut Criterion) {
    let mut group = c.benchmark_group("snap");
    for vertices in [8usize, 64, 512] {
        let geometry = ZoneGeometry::Polygon(vec![ring(Point::new(0.0, 0.0), 1.0, vertices)]);
        group.bench_with_input(
            BenchmarkId::new("outside_point", vertices),
            &geometry,
            |b, geometry| b.iter(|| snap_into_geometry(Point::new(1.7, 0.3), geometry, 1e-5)),
        );
    }
    group.finish();
}

fn bench_directory_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("directory");
    for side in [8usize, 32] {
        let directory = grid_directory(side);
        let far_corner = Point::new(side as f64 - 1.0, side as f64 - 1.0);
        group.bench_with_input(BenchmarkId::new("zone_at", side), &directory, |b, directory| {
            b.iter(|| directory.zone_at(far_corner))
        });
        let bounds = BoundingBox::from_corners(Point::new(0.0, 0.0), far_corner);
        group.bench_with_input(
            BenchmarkId::new("centroid_in_box", side),
            &directory,
            |b, directory| b.iter(|| directory.zones_with_centroid_in(&bounds).len()),
        );
    }
    group.finish();
}

criterion_group!(geometry_benches, bench_snap, bench_directory_queries);
criterion_main!(geometry_benches);
