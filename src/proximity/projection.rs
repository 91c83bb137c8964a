//! Spherical Web Mercator (EPSG:3857) projection.

use geo::Coord;

/// WGS84 semi-major axis used by EPSG:3857
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude where the projected square ends
const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

/// Project (lon, lat) degrees to planar meters.
pub fn to_mercator(c: Coord<f64>) -> Coord<f64> {
    let lat = c.y.clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG).to_radians();
    Coord {
        x: EARTH_RADIUS_M * c.x.to_radians(),
        y: EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Inverse of [`to_mercator`]: planar meters back to (lon, lat) degrees.
pub fn from_mercator(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (c.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees(),
    }
}
