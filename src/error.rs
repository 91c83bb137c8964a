//! Error taxonomy for lookups.
//!
//! An empty result is not an error; callers check the returned records.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Coordinate text did not resolve to exactly two numbers
    #[error("{0}")]
    Format(String),

    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),

    /// Lookup submitted without its required inputs
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("Record store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("CSV export error: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors caused by user input rather than by the service
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Format(_) | Error::InvalidRadius(_) | Error::MissingInput(_)
        )
    }
}
