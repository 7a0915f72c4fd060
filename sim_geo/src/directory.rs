use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use geojson::{GeoJson, Position, Value};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::geometry::{snap_into_geometry, BoundingBox, Point, Ring, ZoneGeometry};

/// Feature property holding a zone's unique name.
pub const NAME_PROPERTY: &str = "name";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read zone file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse zone GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("zone data must be a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub geometry: ZoneGeometry,
    pub properties: Map<String, JsonValue>,
}

impl Zone {
    pub fn new(name: impl Into<String>, geometry: ZoneGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_properties(mut self, properties: Map<String, JsonValue>) -> Self {
        self.properties = properties;
        self
    }

    pub fn centroid(&self) -> Option<Point> {
        self.geometry.vertex_centroid()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.geometry.contains(point)
    }

    /// Numeric properties, the ones usable as metric baselines.
    pub fn numeric_properties(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.properties
            .iter()
            .filter_map(|(key, value)| value.as_f64().map(|number| (key.as_str(), number)))
    }
}

/// Read-only set of named zones, loaded once and shared.
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    zones: Vec<Zone>,
    index: AHashMap<String, usize>,
}

impl ZoneDirectory {
    /// Builds a directory, keeping the first zone for any repeated name.
    pub fn from_zones<I: IntoIterator<Item = Zone>>(zones: I) -> Self {
        let mut directory = Self::default();
        for zone in zones {
            if directory.index.contains_key(&zone.name) {
                tracing::warn!(
                    target: "policy_sim::geo",
                    zone = %zone.name,
                    "zone_directory.duplicate_name"
                );
                continue;
            }
            directory
                .index
                .insert(zone.name.clone(), directory.zones.len());
            directory.zones.push(zone);
        }
        directory
    }

    pub fn from_geojson_str(content: &str) -> Result<Self, DirectoryError> {
        let collection = match content.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection,
            _ => return Err(DirectoryError::NotFeatureCollection),
        };

        let mut zones = Vec::with_capacity(collection.features.len());
        for (position, feature) in collection.features.into_iter().enumerate() {
            let properties = feature.properties.unwrap_or_default();
            let Some(name) = properties
                .get(NAME_PROPERTY)
                .and_then(JsonValue::as_str)
                .map(str::to_owned)
            else {
                tracing::warn!(
                    target: "policy_sim::geo",
                    feature = position,
                    "zone_directory.skipped=missing_name"
                );
                continue;
            };
            let Some(geometry) = feature
                .geometry
                .and_then(|geometry| convert_geometry(&geometry.value))
            else {
                tracing::warn!(
                    target: "policy_sim::geo",
                    zone = %name,
                    "zone_directory.skipped=unsupported_geometry"
                );
                continue;
            };
            zones.push(Zone {
                name,
                geometry,
                properties,
            });
        }

        let directory = Self::from_zones(zones);
        tracing::info!(
            target: "policy_sim::geo",
            zones = directory.len(),
            "zone_directory.loaded"
        );
        Ok(directory)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DirectoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_geojson_str(&content)
    }

    pub fn lookup(&self, name: &str) -> Option<&Zone> {
        self.index.get(name).map(|&idx| &self.zones[idx])
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn all(&self) -> &[Zone] {
        &self.zones
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.zones.iter().map(|zone| zone.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// First zone, in load order, whose geometry contains the point.
    pub fn zone_at(&self, point: Point) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    /// Zones whose vertex centroid falls inside the box, in load order.
    pub fn zones_with_centroid_in(&self, bounds: &BoundingBox) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|zone| zone.centroid().is_some_and(|c| bounds.contains(c)))
            .collect()
    }

    /// Snaps `point` into the named zone. Unknown names return the point as
    /// given.
    pub fn snap_coordinate_into_zone(&self, point: Point, name: &str, epsilon: f64) -> Point {
        match self.lookup(name) {
            Some(zone) => snap_into_geometry(point, &zone.geometry, epsilon),
            None => point,
        }
    }
}

fn convert_position(position: &Position) -> Option<Point> {
    match position.as_slice() {
        [x, y, ..] => Some(Point::new(*x, *y)),
        _ => None,
    }
}

fn convert_ring(ring: &[Position]) -> Ring {
    ring.iter().filter_map(convert_position).collect()
}

fn convert_polygon(rings: &[Vec<Position>]) -> Vec<Ring> {
    rings.iter().map(|ring| convert_ring(ring)).collect()
}

fn convert_geometry(value: &Value) -> Option<ZoneGeometry> {
    match value {
        Value::Polygon(rings) => Some(ZoneGeometry::Polygon(convert_polygon(rings))),
        Value::MultiPolygon(polygons) => Some(ZoneGeometry::MultiPolygon(
            polygons.iter().map(|rings| convert_polygon(rings)).collect(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Harbor", "population": 1200, "median_rent": 1850.5, "district": "east" },
                "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Islands" },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[5,5],[6,5],[6,6],[5,6],[5,5]]],
                    [[[8,8],[9,8],[9,9],[8,9],[8,8]]]
                ] }
            },
            {
                "type": "Feature",
                "properties": { "label": "no name here" },
                "geometry": { "type": "Polygon", "coordinates": [[[2,2],[3,2],[3,3],[2,2]]] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Pin" },
                "geometry": { "type": "Point", "coordinates": [4,4] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Harbor" },
                "geometry": { "type": "Polygon", "coordinates": [[[20,20],[21,20],[21,21],[20,20]]] }
            }
        ]
    }"#;

    #[test]
    fn loads_named_polygonal_features_only() {
        let directory = ZoneDirectory::from_geojson_str(FIXTURE).expect("fixture parses");
        assert_eq!(directory.names().collect::<Vec<_>>(), vec!["Harbor", "Islands"]);
        let harbor = directory.lookup("Harbor").expect("harbor");
        assert!(harbor.contains(Point::new(0.5, 0.5)), "first Harbor wins");
        let mut numeric: Vec<_> = harbor.numeric_properties().map(|(k, _)| k).collect();
        numeric.sort_unstable();
        assert_eq!(numeric, vec!["median_rent", "population"]);
    }

    #[test]
    fn rejects_non_collections() {
        let single = r#"{"type":"Feature","properties":{},"geometry":null}"#;
        assert!(matches!(
            ZoneDirectory::from_geojson_str(single),
            Err(DirectoryError::NotFeatureCollection)
        ));
        assert!(matches!(
            ZoneDirectory::from_geojson_str("not json"),
            Err(DirectoryError::Parse(_))
        ));
    }

    #[test]
    fn spatial_queries() {
        let directory = ZoneDirectory::from_geojson_str(FIXTURE).expect("fixture parses");
        assert_eq!(
            directory.zone_at(Point::new(8.5, 8.5)).map(|z| z.name.as_str()),
            Some("Islands")
        );
        assert!(directory.zone_at(Point::new(3.5, 3.5)).is_none());

        let bounds = BoundingBox::from_corners(Point::new(-1.0, -1.0), Point::new(2.0, 2.0));
        let hits: Vec<_> = directory
            .zones_with_centroid_in(&bounds)
            .into_iter()
            .map(|z| z.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Harbor"]);
    }

    #[test]
    fn snap_into_unknown_zone_is_identity() {
        let directory = ZoneDirectory::from_geojson_str(FIXTURE).expect("fixture parses");
        let point = Point::new(42.0, 42.0);
        assert_eq!(directory.snap_coordinate_into_zone(point, "Nowhere", 1e-5), point);
        let snapped = directory.snap_coordinate_into_zone(Point::new(1.2, 0.5), "Harbor", 1e-5);
        assert!(directory.lookup("Harbor").expect("harbor").contains(snapped));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ZoneDirectory::from_file("/definitely/not/here.geojson")
            .expect_err("missing file");
        assert!(err.to_string().contains("/definitely/not/here.geojson"));
    }
}
