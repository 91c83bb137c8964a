//! Voter record as stored in the `elector` table.

use serde::{Deserialize, Serialize};

/// A single row of the `elector` table.
///
/// Records are read-only for the lookup service; they are only ever written
/// by the import binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Record {
    /// "First Last", skipping missing parts
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Location as a geometric point (x = lon, y = lat)
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

#[cfg(test)]
pub(crate) fn record(id: i64, lat: f64, lon: f64) -> Record {
    Record {
        id,
        first_name: Some(format!("first{}", id)),
        last_name: Some(format!("last{}", id)),
        phone: Some(format!("050-000{:04}", id)),
        street_name: Some("Arie Shenkar".to_string()),
        city: Some("Herzliya".to_string()),
        lat,
        lon,
    }
}
