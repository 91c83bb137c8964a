//! Query parameter types shared by the store, resolver and HTTP layer.

use geo::Rect;
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon, EPSG:4326)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Geometric point with x = lon, y = lat
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// Axis-aligned lat/lon rectangle. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Build from a geometric rect in (lon, lat) space
    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self::new(rect.min().y, rect.max().y, rect.min().x, rect.max().x)
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// R-tree envelope in (lon, lat) order
    pub fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
    }
}

/// Lookup by person name, optionally narrowed by city.
///
/// First and last name match exactly; city matches as a substring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
}

impl PersonQuery {
    /// Drop empty form fields and trim the city fragment
    pub fn normalized(self) -> Self {
        Self {
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
            city: non_empty(self.city.map(|c| c.trim().to_string())),
        }
    }

    pub fn has_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }
}

/// Lookup by street and/or city, both matched as substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressQuery {
    pub street_name: Option<String>,
    pub city: Option<String>,
}

impl AddressQuery {
    pub fn normalized(self) -> Self {
        Self {
            street_name: non_empty(self.street_name.map(|s| s.trim().to_string())),
            city: non_empty(self.city.map(|c| c.trim().to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.street_name.is_none() && self.city.is_none()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
