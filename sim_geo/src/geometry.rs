//! Planar geometry over zone boundaries.
//!
//! Coordinates live in the embedding of the zone data (`x` = longitude,
//! `y` = latitude) and are used as-is; nothing here projects. A polygon is a
//! slice of rings. Containment uses the even-odd rule across every ring, so
//! holes work without knowing which ring is the outer one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

pub type Ring = Vec<Point>;

/// Ray-casting test against a single ring.
///
/// Rings with fewer than three vertices never contain anything. Points lying
/// exactly on an edge may land on either side.
pub fn point_in_ring(point: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// A point is inside the polygon when an odd number of its rings contain it.
pub fn point_in_polygon<R: AsRef<[Point]>>(point: Point, rings: &[R]) -> bool {
    rings
        .iter()
        .filter(|ring| point_in_ring(point, ring.as_ref()))
        .count()
        % 2
        == 1
}

/// Projects `point` onto the segment `a`–`b`, clamped to the segment.
pub fn closest_point_on_segment(point: Point, a: Point, b: Point) -> Point {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= 0.0 {
        return a;
    }
    let t = (((point.x - a.x) * abx + (point.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * abx, a.y + t * aby)
}

/// Edges of a ring, adding the closing edge when the ring is not explicitly
/// closed. A single-vertex ring yields one zero-length edge.
fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let closing = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() == 1 || first != last => Some((*last, *first)),
        _ => None,
    };
    ring.windows(2)
        .map(|pair| (pair[0], pair[1]))
        .chain(closing)
}

/// Closest point on any edge of any ring, scanning every edge.
///
/// Returns `None` when the polygon has no vertices at all.
pub fn nearest_point_on_polygon_boundary<R: AsRef<[Point]>>(
    point: Point,
    rings: &[R],
) -> Option<Point> {
    nearest_hit(point, rings).map(|hit| hit.point)
}

/// Nearest boundary point together with the edge it lies on.
#[derive(Debug, Clone, Copy)]
struct BoundaryHit {
    point: Point,
    dist_sq: f64,
    edge: (Point, Point),
}

fn nearest_hit<R: AsRef<[Point]>>(point: Point, rings: &[R]) -> Option<BoundaryHit> {
    let mut best: Option<BoundaryHit> = None;
    for ring in rings {
        for (a, b) in ring_edges(ring.as_ref()) {
            let candidate = closest_point_on_segment(point, a, b);
            let dist_sq = point.distance_squared(candidate);
            if best.map_or(true, |hit| dist_sq < hit.dist_sq) {
                best = Some(BoundaryHit {
                    point: candidate,
                    dist_sq,
                    edge: (a, b),
                });
            }
        }
    }
    best
}

/// Axis-aligned rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn of_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_corners(first, first), |acc, p| Self {
            min: Point::new(acc.min.x.min(p.x), acc.min.y.min(p.y)),
            max: Point::new(acc.max.x.max(p.x), acc.max.y.max(p.y)),
        }))
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Boundary of a zone: one polygon or several.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl ZoneGeometry {
    pub fn polygons(&self) -> impl Iterator<Item = &[Ring]> + '_ {
        let polygons: &[Vec<Ring>] = match self {
            ZoneGeometry::Polygon(rings) => std::slice::from_ref(rings),
            ZoneGeometry::MultiPolygon(polygons) => polygons.as_slice(),
        };
        polygons.iter().map(Vec::as_slice)
    }

    fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.polygons()
            .flat_map(|rings| rings.iter())
            .flat_map(|ring| ring.iter().copied())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().count()
    }

    /// True when any member polygon contains the point.
    pub fn contains(&self, point: Point) -> bool {
        self.polygons().any(|rings| point_in_polygon(point, rings))
    }

    /// Mean of every ring vertex, all polygons flattened together.
    pub fn vertex_centroid(&self) -> Option<Point> {
        let (sum, count) = self
            .vertices()
            .fold((Point::default(), 0usize), |(sum, count), p| {
                (Point::new(sum.x + p.x, sum.y + p.y), count + 1)
            });
        if count == 0 {
            return None;
        }
        Some(Point::new(sum.x / count as f64, sum.y / count as f64))
    }

    pub fn nearest_boundary_point(&self, point: Point) -> Option<Point> {
        self.nearest_hit(point).map(|hit| hit.point)
    }

    fn nearest_hit(&self, point: Point) -> Option<BoundaryHit> {
        self.polygons()
            .filter_map(|rings| nearest_hit(point, rings))
            .min_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq))
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.vertices())
    }
}

/// Returns `point` unchanged when the geometry already contains it; otherwise
/// the nearest boundary point pushed `epsilon` further along the
/// point→boundary direction so the result sits inside rather than on the
/// edge.
///
/// A point lying on the boundary is its own nearest boundary point, so there
/// is no such direction. It is stepped `epsilon` off the owning edge instead,
/// along whichever edge normal lands inside, falling back to a step toward the
/// vertex centroid (corners). Only when none of those land inside is the
/// point returned as-is.
pub fn snap_into_geometry(point: Point, geometry: &ZoneGeometry, epsilon: f64) -> Point {
    if geometry.contains(point) {
        return point;
    }
    let Some(hit) = geometry.nearest_hit(point) else {
        return point;
    };
    let boundary = hit.point;
    if let Some(step) = unit(boundary.x - point.x, boundary.y - point.y) {
        return offset(boundary, step, epsilon);
    }
    let (a, b) = hit.edge;
    let mut steps = Vec::with_capacity(3);
    if let Some((ex, ey)) = unit(b.x - a.x, b.y - a.y) {
        steps.push((-ey, ex));
        steps.push((ey, -ex));
    }
    if let Some(center) = geometry.vertex_centroid() {
        steps.extend(unit(center.x - boundary.x, center.y - boundary.y));
    }
    steps
        .into_iter()
        .map(|step| offset(boundary, step, epsilon))
        .find(|candidate| geometry.contains(*candidate))
        .unwrap_or(point)
}

fn unit(dx: f64, dy: f64) -> Option<(f64, f64)> {
    let len = dx.hypot(dy);
    (len > 0.0 && len.is_finite()).then(|| (dx / len, dy / len))
}

fn offset(from: Point, (ux, uy): (f64, f64), distance: f64) -> Point {
    Point::new(from.x + ux * distance, from.y + uy * distance)
}
