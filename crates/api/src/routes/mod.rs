//! HTTP route handlers.

pub mod admin;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses an id path segment, rejecting malformed values with 400.
pub(crate) fn parse_id<T>(kind: &str, id: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    id.parse::<T>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} id: {e}")))
}
