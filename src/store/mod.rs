//! Read access to the `elector` record table.
//!
//! [`SqliteStore`] talks to the database; [`IndexedStore`] keeps records in
//! memory behind an R-tree and answers the same queries. [`Backend`] is the
//! one the query server picks at startup.

mod indexed;
mod sqlite;

use std::future::Future;

pub use indexed::IndexedStore;
pub use sqlite::SqliteStore;

#[cfg(test)]
pub(crate) use sqlite::memory_store;

use tracing::info;

use crate::config::StoreBackend;
use crate::error::Result;
use crate::models::{AddressQuery, BoundingBox, PersonQuery, Record};

/// Row cap for name and address lookups
pub const LOOKUP_LIMIT: usize = 100;

/// Parameterized read queries over stored records
pub trait RecordStore: Send + Sync {
    /// Exact id match
    fn by_id(&self, id: i64) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Exact first/last name, city substring, at most [`LOOKUP_LIMIT`] rows
    fn by_person(&self, query: &PersonQuery) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Street and city substrings, at most [`LOOKUP_LIMIT`] rows
    fn by_address(
        &self,
        query: &AddressQuery,
    ) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// All records whose (lat, lon) lies inside `bbox`, bounds inclusive, no row limit
    fn in_bbox(&self, bbox: &BoundingBox) -> impl Future<Output = Result<Vec<Record>>> + Send;
}

/// Record store chosen by `store.backend`
pub enum Backend {
    Sqlite(SqliteStore),
    Memory(IndexedStore),
}

impl Backend {
    /// Serve from `sqlite` directly, or load its whole table into an R-tree
    pub async fn load(sqlite: SqliteStore, kind: StoreBackend) -> Result<Self> {
        match kind {
            StoreBackend::Sqlite => Ok(Backend::Sqlite(sqlite)),
            StoreBackend::Memory => {
                let records = sqlite.all_records().await?;
                info!("Loaded {} records into memory", records.len());
                Ok(Backend::Memory(IndexedStore::new(records)))
            }
        }
    }

    pub async fn count(&self) -> Result<i64> {
        match self {
            Backend::Sqlite(store) => store.count().await,
            Backend::Memory(store) => Ok(store.len() as i64),
        }
    }
}

impl RecordStore for Backend {
    async fn by_id(&self, id: i64) -> Result<Vec<Record>> {
        match self {
            Backend::Sqlite(store) => store.by_id(id).await,
            Backend::Memory(store) => store.by_id(id).await,
        }
    }

    async fn by_person(&self, query: &PersonQuery) -> Result<Vec<Record>> {
        match self {
            Backend::Sqlite(store) => store.by_person(query).await,
            Backend::Memory(store) => store.by_person(query).await,
        }
    }

    async fn by_address(&self, query: &AddressQuery) -> Result<Vec<Record>> {
        match self {
            Backend::Sqlite(store) => store.by_address(query).await,
            Backend::Memory(store) => store.by_address(query).await,
        }
    }

    async fn in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<Record>> {
        match self {
            Backend::Sqlite(store) => store.in_bbox(bbox).await,
            Backend::Memory(store) => store.in_bbox(bbox).await,
        }
    }
}
