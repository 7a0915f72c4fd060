#![allow(dead_code)]

use std::time::Duration;

use sim_geo::{Point, ZoneDirectory};

/// Three zones: two unit squares on the bottom row and a wide block above.
///
/// ```text
///  y=5 +-----------------+
///      |     Uplands     |
///  y=2 +-----------------+
///  y=1 +----+      +----+
///      |Harb|      |Midt|
///  y=0 +----+      +----+
///      x=0  1      2    3
/// ```
pub const ZONES_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "name": "Harbor", "population": 1000, "medianRent": 1500 },
      "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]] }
    },
    {
      "type": "Feature",
      "properties": { "name": "Midtown", "population": 5000 },
      "geometry": { "type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]] }
    },
    {
      "type": "Feature",
      "properties": { "name": "Uplands" },
      "geometry": { "type": "Polygon", "coordinates": [[[0,2],[3,2],[3,5],[0,5],[0,2]]] }
    }
  ]
}"#;

pub fn directory() -> ZoneDirectory {
    ZoneDirectory::from_geojson_str(ZONES_GEOJSON).expect("fixture parses")
}

/// A screen transform of 100 px per zone unit.
pub fn screen_of(point: Point) -> core_sim::ScreenPos {
    core_sim::ScreenPos::new(point.x * 100.0, point.y * 100.0)
}

pub fn sample(x: f64, y: f64, ms: u64) -> core_sim::PointerSample {
    let geo = Point::new(x, y);
    core_sim::PointerSample {
        screen: screen_of(geo),
        geo,
        at: Duration::from_millis(ms),
    }
}

/// One `data:` frame carrying an event in `zone`; coordinates are `[lat, lon]`.
pub fn event_frame(id: &str, zone: &str, lat: f64, lon: f64, metrics: &str) -> String {
    format!(
        "data: {{\"type\":\"event\",\"data\":{{\"id\":\"{id}\",\"zoneName\":\"{zone}\",\"type\":\"housing\",\"title\":\"Event {id}\",\"severity\":0.4,\"positivity\":0.3,\"coordinates\":[{lat},{lon}],\"metrics\":{metrics}}}}}\n\n"
    )
}

pub fn update_frame(message: &str, zones: u32) -> String {
    format!("data: {{\"type\":\"update\",\"data\":{{\"message\":\"{message}\",\"zonesCount\":{zones}}}}}\n\n")
}

pub fn complete_frame(summary: &str) -> String {
    format!("data: {{\"type\":\"complete\",\"data\":{{\"summary\":\"{summary}\"}}}}\n\n")
}
