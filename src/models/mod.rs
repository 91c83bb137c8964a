//! Core data models for the lookup service.

pub mod query;
pub mod record;

pub use query::{AddressQuery, BoundingBox, Coordinate, PersonQuery};
pub use record::Record;
