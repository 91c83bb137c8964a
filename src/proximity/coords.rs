//! Free-form coordinate text parsing.

use crate::error::{Error, Result};
use crate::models::Coordinate;

const FORMAT_MESSAGE: &str = "Invalid coordinate format! Use 'lat lon' or 'lat, lon'.";

/// Parse "lat lon" or "lat, lon" into a coordinate.
///
/// Commas count as whitespace, so any mix of separators is accepted. The text
/// must hold exactly two finite decimal numbers.
pub fn parse_coordinates(text: &str) -> Result<Coordinate> {
    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    let [lat, lon] = tokens.as_slice() else {
        return Err(Error::Format(FORMAT_MESSAGE.to_string()));
    };

    let lat = parse_number(lat)?;
    let lon = parse_number(lon)?;

    Ok(Coordinate::new(lat, lon))
}

fn parse_number(token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Format(FORMAT_MESSAGE.to_string()))
}
