use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::Error;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Where lookups are answered from
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Query the SQLite database directly
    #[default]
    Sqlite,
    /// Load the table at startup and serve it from an in-memory R-tree
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub backend: StoreBackend,
    /// Memoize query results in process
    pub cache: bool,
    /// Maximum number of memoized queries
    pub cache_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/geodude.db".to_string(),
            max_connections: 4,
            backend: StoreBackend::Sqlite,
            cache: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Radius bounds accepted from the HTTP surface, in meters
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub default_radius: f64,
    pub min_radius: f64,
    pub max_radius: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_radius: 15.0,
            min_radius: 1.0,
            max_radius: 100.0,
        }
    }
}

impl QueryConfig {
    /// Apply the default to a missing radius and enforce the bounds
    pub fn radius(&self, requested: Option<f64>) -> std::result::Result<f64, Error> {
        let radius = requested.unwrap_or(self.default_radius);
        if radius.is_finite() && radius >= self.min_radius && radius <= self.max_radius {
            Ok(radius)
        } else {
            Err(Error::InvalidRadius(radius))
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let q = &self.query;
        ensure!(q.min_radius > 0.0, "query.min_radius must be positive");
        ensure!(
            q.min_radius <= q.default_radius && q.default_radius <= q.max_radius,
            "query.default_radius must lie within [min_radius, max_radius]"
        );
        ensure!(
            self.store.max_connections > 0,
            "store.max_connections must be positive"
        );
        ensure!(
            self.store.cache_capacity > 0,
            "store.cache_capacity must be positive"
        );
        Ok(())
    }
}
