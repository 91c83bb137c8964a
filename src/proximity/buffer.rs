//! Point buffering in planar meters.

use geo::{Coord, LineString, MapCoords, Polygon};

use super::projection::{from_mercator, to_mercator};
use crate::models::Coordinate;

/// Segments per quarter circle of the buffer ring
pub const BUFFER_QUAD_SEGMENTS: usize = 16;

/// Disk of `radius` units around `center`, as a closed ring in the same plane.
fn disk(center: Coord<f64>, radius: f64, quad_segments: usize) -> Polygon<f64> {
    let segments = quad_segments * 4;
    let step = std::f64::consts::TAU / segments as f64;

    let ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let angle = step * i as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();

    // Polygon::new closes the exterior ring
    Polygon::new(LineString::new(ring), vec![])
}

/// Search polygon around `center` in geographic (lon, lat) coordinates.
///
/// The buffer is applied in Web Mercator meters and the ring is projected
/// back vertex by vertex. A non-positive radius yields an empty polygon.
pub fn search_polygon(center: Coordinate, radius_m: f64) -> Polygon<f64> {
    if radius_m <= 0.0 {
        return Polygon::new(LineString::new(vec![]), vec![]);
    }
    let planar_center = to_mercator(center.to_point().0);
    disk(planar_center, radius_m, BUFFER_QUAD_SEGMENTS).map_coords(from_mercator)
}
