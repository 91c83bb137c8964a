use std::str::FromStr;

use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Arguments;
use tracing::{debug, info};

use super::{RecordStore, LOOKUP_LIMIT};
use crate::error::Result;
use crate::models::{AddressQuery, BoundingBox, PersonQuery, Record};

const SQL_CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS elector (
    id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    phone TEXT,
    street_name TEXT,
    city TEXT,
    lat REAL NOT NULL,
    lon REAL NOT NULL
)
"#;

const SQL_CREATE_LAT_LON_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS elector_lat_lon ON elector (lat, lon)";

const SQL_INSERT_RECORD: &str = r#"
INSERT OR REPLACE INTO elector (id, first_name, last_name, phone, street_name, city, lat, lon)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SQL_COUNT: &str = "SELECT COUNT(*) FROM elector";

const SQL_ALL: &str = "SELECT * FROM elector ORDER BY id";

const SQL_BY_ID: &str = "SELECT * FROM elector WHERE id = ?";

const SQL_FILTER_BASE: &str = "SELECT * FROM elector WHERE 1=1";

const SQL_IN_BBOX: &str = "SELECT * FROM elector WHERE lat BETWEEN ? AND ? AND lon BETWEEN ? AND ?";

/// Record store backed by a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database at `url` (e.g. `sqlite://data/geodude.db`).
    ///
    /// A read-only store refuses writes; a writable one creates the file if
    /// it does not exist.
    pub async fn connect(url: &str, read_only: bool, max_connections: u32) -> Result<Self> {
        info!("Opening SQLite database at {}...", url);
        let options = SqliteConnectOptions::from_str(url)?
            .read_only(read_only)
            .create_if_missing(!read_only);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `elector` table and its coordinate index if missing
    pub async fn create_schema(&self) -> Result<()> {
        sqlx::query(SQL_CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(SQL_CREATE_LAT_LON_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert (or replace by id) a batch of records in one transaction
    pub async fn insert_records(&self, records: &[Record]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for r in records {
            let res = sqlx::query(SQL_INSERT_RECORD)
                .bind(r.id)
                .bind(r.first_name.as_deref())
                .bind(r.last_name.as_deref())
                .bind(r.phone.as_deref())
                .bind(r.street_name.as_deref())
                .bind(r.city.as_deref())
                .bind(r.lat)
                .bind(r.lon)
                .execute(&mut *tx)
                .await?;
            inserted += res.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(SQL_COUNT).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Every row, ordered by id
    pub async fn all_records(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query_as::<_, Record>(SQL_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_filtered(&self, sql: &str, args: SqliteArguments<'_>) -> Result<Vec<Record>> {
        debug!("Store query: {}", sql);
        let rows = sqlx::query_as_with::<_, Record, _>(sql, args)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn add_arg<'q, T>(args: &mut SqliteArguments<'q>, value: T) -> Result<()>
where
    T: 'q + sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    args.add(value).map_err(sqlx::Error::Encode)?;
    Ok(())
}

impl RecordStore for SqliteStore {
    async fn by_id(&self, id: i64) -> Result<Vec<Record>> {
        let rows = sqlx::query_as::<_, Record>(SQL_BY_ID)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn by_person(&self, query: &PersonQuery) -> Result<Vec<Record>> {
        let mut sql = String::from(SQL_FILTER_BASE);
        let mut args = SqliteArguments::default();

        if let Some(first_name) = &query.first_name {
            sql.push_str(" AND first_name = ?");
            add_arg(&mut args, first_name.clone())?;
        }
        if let Some(last_name) = &query.last_name {
            sql.push_str(" AND last_name = ?");
            add_arg(&mut args, last_name.clone())?;
        }
        if let Some(city) = &query.city {
            sql.push_str(" AND city LIKE ?");
            add_arg(&mut args, format!("%{}%", city.trim()))?;
        }
        sql.push_str(&format!(" LIMIT {}", LOOKUP_LIMIT));

        self.fetch_filtered(&sql, args).await
    }

    async fn by_address(&self, query: &AddressQuery) -> Result<Vec<Record>> {
        let mut sql = String::from(SQL_FILTER_BASE);
        let mut args = SqliteArguments::default();

        if let Some(street) = &query.street_name {
            sql.push_str(" AND street_name LIKE ?");
            add_arg(&mut args, format!("%{}%", street.trim()))?;
        }
        if let Some(city) = &query.city {
            sql.push_str(" AND city LIKE ?");
            add_arg(&mut args, format!("%{}%", city.trim()))?;
        }
        sql.push_str(&format!(" LIMIT {}", LOOKUP_LIMIT));

        self.fetch_filtered(&sql, args).await
    }

    async fn in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<Record>> {
        let rows = sqlx::query_as::<_, Record>(SQL_IN_BBOX)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) async fn memory_store(records: &[Record]) -> SqliteStore {
    // One connection, one in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteStore::from_pool(pool);
    store.create_schema().await.unwrap();
    store.insert_records(records).await.unwrap();
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::record;

    fn named(id: i64, first: &str, last: &str, street: &str, city: &str) -> Record {
        Record {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            street_name: Some(street.to_string()),
            city: Some(city.to_string()),
            ..record(id, 32.0, 34.0)
        }
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = memory_store(&[record(1, 32.0, 34.0), record(2, 32.1, 34.1)]).await;
        assert_eq!(store.count().await.unwrap(), 2);

        // Same id replaces the existing row
        store.insert_records(&[record(2, 33.0, 35.0)]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.by_id(2).await.unwrap()[0].lat, 33.0);
    }

    #[tokio::test]
    async fn test_all_records_ordered_by_id() {
        let store = memory_store(&[record(3, 32.0, 34.0), record(1, 32.1, 34.1)]).await;
        let ids: Vec<i64> = store.all_records().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_by_id() {
        let store = memory_store(&[record(329999999, 32.0, 34.0)]).await;
        let rows = store.by_id(329999999).await.unwrap();
        assert_eq!(rows, vec![record(329999999, 32.0, 34.0)]);
        assert!(store.by_id(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_by_person() {
        let store = memory_store(&[
            named(1, "Asaf", "Lutz", "Arie Shenkar 3", "Herzliya"),
            named(2, "Asaf", "Cohen", "Sokolov 1", "Herzliya Pituach"),
            named(3, "Dana", "Lutz", "Herzl 10", "Tel Aviv"),
        ])
        .await;

        let q = PersonQuery {
            first_name: Some("Asaf".to_string()),
            ..Default::default()
        };
        let ids: Vec<i64> = store.by_person(&q).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let q = PersonQuery {
            last_name: Some("Lutz".to_string()),
            city: Some(" tel ".to_string()),
            ..Default::default()
        };
        let ids: Vec<i64> = store.by_person(&q).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3]);

        // Name match is exact
        let q = PersonQuery {
            first_name: Some("asaf".to_string()),
            ..Default::default()
        };
        assert!(store.by_person(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_by_address() {
        let store = memory_store(&[
            named(1, "Asaf", "Lutz", "Arie Shenkar 3", "Herzliya"),
            named(2, "Asaf", "Cohen", "Sokolov 1", "Herzliya"),
        ])
        .await;

        let q = AddressQuery {
            street_name: Some("shenkar".to_string()),
            city: None,
        };
        let ids: Vec<i64> = store.by_address(&q).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_lookup_limit() {
        let records: Vec<Record> = (0..150)
            .map(|i| named(i, "Asaf", "Lutz", "Herzl", "Herzliya"))
            .collect();
        let store = memory_store(&records).await;

        let q = AddressQuery {
            street_name: None,
            city: Some("Herzliya".to_string()),
        };
        assert_eq!(store.by_address(&q).await.unwrap().len(), LOOKUP_LIMIT);
    }

    #[tokio::test]
    async fn test_in_bbox_inclusive() {
        let store = memory_store(&[
            record(1, 32.0, 34.0),
            record(2, 32.5, 34.5),
            record(3, 33.0, 35.0),
            record(4, 33.1, 34.5),
        ])
        .await;

        let bbox = BoundingBox::new(32.0, 33.0, 34.0, 35.0);
        let ids: Vec<i64> = store.in_bbox(&bbox).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
