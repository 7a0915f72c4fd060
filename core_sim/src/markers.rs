use sim_geo::{Point, ZoneDirectory};
use sim_proto::{GeoCoordinate, SimulationEvent};

/// Wire coordinates are `[lat, lon]`; zone geometry is `x = lon, y = lat`.
pub fn coordinate_to_point(coordinate: GeoCoordinate) -> Point {
    Point::new(coordinate.lon, coordinate.lat)
}

/// Where to draw an event: its coordinate, pulled inside the owning zone when
/// it lands outside. Events for zones the directory does not know keep their
/// raw coordinate.
pub fn marker_position(event: &SimulationEvent, directory: &ZoneDirectory, epsilon: f64) -> Point {
    let raw = coordinate_to_point(event.coordinates);
    directory.snap_coordinate_into_zone(raw, event.owning_zone(), epsilon)
}
