//! Zone geometry for the policy simulation client.
//!
//! [`geometry`] holds the planar helpers (containment, boundary projection,
//! bounding boxes). [`directory`] turns a GeoJSON FeatureCollection into the
//! read-only [`ZoneDirectory`] the rest of the workspace resolves zones from.

pub mod directory;
pub mod geometry;

pub use directory::{DirectoryError, Zone, ZoneDirectory, NAME_PROPERTY};
pub use geometry::{
    closest_point_on_segment, nearest_point_on_polygon_boundary, point_in_polygon,
    point_in_ring, snap_into_geometry, BoundingBox, Point, Ring, ZoneGeometry,
};
