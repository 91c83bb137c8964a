//! In-memory record store with an R-tree over record coordinates.
//!
//! The bounding-box stage becomes an envelope range query. Name and address
//! lookups scan the records and follow SQLite semantics: `=` is an exact
//! match and `LIKE '%x%'` is matched with SQLite's default `LIKE` rules
//! (`%` any run, `_` any one character, ASCII case folding, no escape).

use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::info;

use super::{RecordStore, LOOKUP_LIMIT};
use crate::error::Result;
use crate::models::{AddressQuery, BoundingBox, PersonQuery, Record};

/// Record position (lon, lat) tagged with its slot in `records`
type IndexedPoint = GeomWithData<[f64; 2], usize>;

pub struct IndexedStore {
    records: Vec<Record>,
    tree: RTree<IndexedPoint>,
}

impl IndexedStore {
    /// Build the index. Records keep their order for lookups.
    pub fn new(records: Vec<Record>) -> Self {
        let points: Vec<IndexedPoint> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.lat.is_finite() && r.lon.is_finite())
            .map(|(slot, r)| GeomWithData::new([r.lon, r.lat], slot))
            .collect();

        let tree = RTree::bulk_load(points);
        info!(
            "Spatial index built with {} of {} records",
            tree.size(),
            records.len()
        );

        Self { records, tree }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn scan<F>(&self, predicate: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .take(LOOKUP_LIMIT)
            .cloned()
            .collect()
    }
}

fn equals(value: &Option<String>, expected: &Option<String>) -> bool {
    match expected {
        Some(expected) => value.as_deref() == Some(expected.as_str()),
        None => true,
    }
}

/// `value LIKE pattern` with backtracking on the last `%`
fn like(value: &str, pattern: &str) -> bool {
    let text: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p).copied() {
            Some('%') => {
                resume = Some((p, t));
                p += 1;
            }
            Some(c) if c == '_' || c.eq_ignore_ascii_case(&text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((star, start)) => {
                    p = star + 1;
                    t = start + 1;
                    resume = Some((star, start + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

/// `value LIKE '%fragment%'`, the filter `SqliteStore` binds
fn like_contains(value: &Option<String>, fragment: &Option<String>) -> bool {
    match fragment {
        Some(fragment) => value
            .as_deref()
            .map(|v| like(v, &format!("%{}%", fragment.trim())))
            .unwrap_or(false),
        None => true,
    }
}

impl RecordStore for IndexedStore {
    async fn by_id(&self, id: i64) -> Result<Vec<Record>> {
        Ok(self.records.iter().filter(|r| r.id == id).cloned().collect())
    }

    async fn by_person(&self, query: &PersonQuery) -> Result<Vec<Record>> {
        Ok(self.scan(|r| {
            equals(&r.first_name, &query.first_name)
                && equals(&r.last_name, &query.last_name)
                && like_contains(&r.city, &query.city)
        }))
    }

    async fn by_address(&self, query: &AddressQuery) -> Result<Vec<Record>> {
        Ok(self.scan(|r| {
            like_contains(&r.street_name, &query.street_name) && like_contains(&r.city, &query.city)
        }))
    }

    async fn in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<Record>> {
        let mut slots: Vec<usize> = self
            .tree
            .locate_in_envelope(&bbox.envelope())
            .map(|p| p.data)
            .collect();
        slots.sort_unstable();

        Ok(slots.into_iter().map(|i| self.records[i].clone()).collect())
    }
}
