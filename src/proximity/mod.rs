//! Radius (proximity) queries.
//!
//! A coordinate and radius are turned into a search polygon by buffering the
//! point in Web Mercator meters. Candidates are fetched from the store by the
//! polygon's bounding box, then filtered with an exact point-in-polygon test.

mod buffer;
mod coords;
mod projection;
mod resolver;

pub use buffer::{search_polygon, BUFFER_QUAD_SEGMENTS};
pub use coords::parse_coordinates;
pub use projection::{from_mercator, to_mercator, EARTH_RADIUS_M};
pub use resolver::{RadiusQuery, RadiusResolver, MAX_RADIUS_RESULTS};
