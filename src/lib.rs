//! GeoDude - voter record lookup with radius queries
//!
//! This library provides the store, query and map-shaping modules shared by
//! the query server and the import binary.

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod lookup;
pub mod map;
pub mod models;
pub mod proximity;
pub mod store;

pub use error::{Error, Result};
pub use lookup::{execute, Lookup, LookupOutcome};
pub use models::{AddressQuery, BoundingBox, Coordinate, PersonQuery, Record};
