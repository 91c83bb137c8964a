//! Radius query resolution: bounding-box prefetch followed by exact
//! point-in-polygon filtering.

use geo::{BoundingRect, Contains, Polygon};
use tracing::debug;

use super::buffer::search_polygon;
use super::coords::parse_coordinates;
use crate::error::{Error, Result};
use crate::models::{BoundingBox, Coordinate, Record};
use crate::store::RecordStore;

/// Upper bound on records returned by a radius query
pub const MAX_RADIUS_RESULTS: usize = 1000;

/// Outcome of a radius query
#[derive(Debug, Clone)]
pub struct RadiusQuery {
    pub center: Coordinate,
    pub radius_m: f64,
    /// Search polygon in (lon, lat) coordinates
    pub polygon: Polygon<f64>,
    /// `None` when the polygon is empty (zero radius)
    pub bbox: Option<BoundingBox>,
    /// Raw store rows inside the bounding box
    pub bounding_box_records: Vec<Record>,
    /// Rows strictly inside the polygon, in store order, capped
    pub results: Vec<Record>,
}

impl RadiusQuery {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Resolves radius queries against a record store
pub struct RadiusResolver<'a, S> {
    store: &'a S,
    max_results: usize,
}

impl<'a, S: RecordStore> RadiusResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_results: MAX_RADIUS_RESULTS,
        }
    }

    /// Parse `text` as a coordinate and resolve it.
    pub async fn resolve_text(&self, text: &str, radius_m: f64) -> Result<RadiusQuery> {
        let center = parse_coordinates(text)?;
        self.resolve(center, radius_m).await
    }

    /// Find records within `radius_m` Mercator meters of `center`.
    ///
    /// Points on the polygon boundary are excluded.
    pub async fn resolve(&self, center: Coordinate, radius_m: f64) -> Result<RadiusQuery> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(Error::InvalidRadius(radius_m));
        }

        let polygon = search_polygon(center, radius_m);
        let bbox = polygon.bounding_rect().map(BoundingBox::from_rect);

        let bounding_box_records = match &bbox {
            Some(bbox) => self.store.in_bbox(bbox).await?,
            None => Vec::new(),
        };

        let results: Vec<Record> = if bounding_box_records.is_empty() {
            Vec::new()
        } else {
            bounding_box_records
                .iter()
                .filter(|r| polygon.contains(&r.point()))
                .take(self.max_results)
                .cloned()
                .collect()
        };

        debug!(
            "Radius query at ({}, {}) r={}m: {} in bbox, {} in polygon",
            center.lat,
            center.lon,
            radius_m,
            bounding_box_records.len(),
            results.len()
        );

        Ok(RadiusQuery {
            center,
            radius_m,
            polygon,
            bbox,
            bounding_box_records,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::record;
    use crate::proximity::{from_mercator, to_mercator};
    use crate::store::IndexedStore;
    use geo::Coord;

    const CENTER: Coordinate = Coordinate {
        lat: 32.1602,
        lon: 34.8097,
    };

    /// Record displaced from CENTER by (dx, dy) Mercator meters
    fn offset_record(id: i64, dx: f64, dy: f64) -> Record {
        let c = to_mercator(CENTER.to_point().0);
        let p = from_mercator(Coord {
            x: c.x + dx,
            y: c.y + dy,
        });
        record(id, p.y, p.x)
    }

    fn planar_distance(r: &Record) -> f64 {
        let c = to_mercator(CENTER.to_point().0);
        let p = to_mercator(r.point().0);
        ((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt()
    }

    #[tokio::test]
    async fn test_resolve_text_builds_polygon_around_point() {
        let store = IndexedStore::new(vec![]);
        let query = RadiusResolver::new(&store)
            .resolve_text("32.1602, 34.8097", 15.0)
            .await
            .unwrap();

        assert_eq!(query.center, CENTER);
        use geo::Centroid;
        let centroid = query.polygon.centroid().unwrap();
        assert!((centroid.x() - CENTER.lon).abs() < 1e-9);
        assert!((centroid.y() - CENTER.lat).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_resolve_text_format_error() {
        let store = IndexedStore::new(vec![record(1, CENTER.lat, CENTER.lon)]);
        let err = RadiusResolver::new(&store)
            .resolve_text("32.1602 34.8097 extra", 15.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[tokio::test]
    async fn test_corner_record_is_excluded() {
        // Third record sits in the gap between the disk and its bounding box
        let store = IndexedStore::new(vec![
            offset_record(1, 0.0, 0.0),
            offset_record(2, 5.0, -3.0),
            offset_record(3, -14.0, 14.0),
        ]);

        let query = RadiusResolver::new(&store).resolve(CENTER, 15.0).await.unwrap();

        assert_eq!(query.bounding_box_records.len(), 3);
        let ids: Vec<i64> = query.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_boundary_record_is_excluded() {
        use crate::proximity::search_polygon;

        let vertex = search_polygon(CENTER, 15.0).exterior().0[0];
        let store = IndexedStore::new(vec![
            record(1, vertex.y, vertex.x),
            offset_record(2, 0.0, 0.0),
        ]);

        let query = RadiusResolver::new(&store).resolve(CENTER, 15.0).await.unwrap();

        assert_eq!(query.bounding_box_records.len(), 2);
        let ids: Vec<i64> = query.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_empty_bbox_is_not_an_error() {
        let store = IndexedStore::new(vec![record(1, 31.0, 35.0)]);
        let query = RadiusResolver::new(&store).resolve(CENTER, 50.0).await.unwrap();
        assert!(query.bounding_box_records.is_empty());
        assert!(query.is_empty());
    }

    #[tokio::test]
    async fn test_results_within_radius_and_bbox() {
        let mut records = Vec::new();
        let mut id = 0;
        for ix in -12..=12 {
            for iy in -12..=12 {
                id += 1;
                records.push(offset_record(id, ix as f64 * 2.5, iy as f64 * 2.5));
            }
        }
        let store = IndexedStore::new(records);

        let radius = 25.0;
        let query = RadiusResolver::new(&store).resolve(CENTER, radius).await.unwrap();
        let bbox = query.bbox.unwrap();

        assert!(!query.results.is_empty());
        assert!(query.results.len() < query.bounding_box_records.len());
        for r in &query.results {
            assert!(planar_distance(r) <= radius + 1e-6);
            assert!(bbox.contains(r.lat, r.lon));
            assert!(query.bounding_box_records.contains(r));
        }
    }

    #[tokio::test]
    async fn test_results_keep_store_order() {
        let store = IndexedStore::new(vec![
            offset_record(7, 3.0, 0.0),
            offset_record(3, 0.0, 0.0),
            offset_record(5, -3.0, 0.0),
        ]);
        let query = RadiusResolver::new(&store).resolve(CENTER, 10.0).await.unwrap();
        let ids: Vec<i64> = query.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 3, 5]);
    }

    #[tokio::test]
    async fn test_results_capped() {
        let records = (0..1500).map(|i| offset_record(i, 0.0, 0.0)).collect();
        let store = IndexedStore::new(records);

        let query = RadiusResolver::new(&store).resolve(CENTER, 5.0).await.unwrap();

        assert_eq!(query.bounding_box_records.len(), 1500);
        assert_eq!(query.results.len(), MAX_RADIUS_RESULTS);
        assert_eq!(query.results[0].id, 0);
        assert_eq!(query.results[999].id, 999);
    }

    #[tokio::test]
    async fn test_zero_radius_is_empty() {
        let store = IndexedStore::new(vec![offset_record(1, 0.0, 0.0)]);
        let query = RadiusResolver::new(&store).resolve(CENTER, 0.0).await.unwrap();
        assert!(query.bbox.is_none());
        assert!(query.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_radius() {
        let store = IndexedStore::new(vec![]);
        let resolver = RadiusResolver::new(&store);
        assert!(matches!(
            resolver.resolve(CENTER, -1.0).await,
            Err(Error::InvalidRadius(_))
        ));
        assert!(matches!(
            resolver.resolve(CENTER, f64::NAN).await,
            Err(Error::InvalidRadius(_))
        ));
    }
}
