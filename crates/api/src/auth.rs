//! Caller identity extractors.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! identity in two headers:
//! - `x-user-id`: the user's UUID
//! - `x-user-role`: `customer` (default when absent) or `admin`
//!
//! # Example
//!
//! ```ignore
//! async fn handler(principal: Principal) -> String {
//!     format!("user {}", principal.user_id)
//! }
//! ```

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reads the identity headers.
    ///
    /// Returns `Ok(None)` when no user id is present and `Unauthorized` when
    /// either header is malformed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, ApiError> {
        let Some(raw_id) = headers.get(USER_ID_HEADER) else {
            return Ok(None);
        };
        let user_id = raw_id
            .to_str()
            .ok()
            .and_then(|id| id.trim().parse::<UserId>().ok())
            .ok_or_else(|| ApiError::Unauthorized("Not authorized, invalid user id".to_string()))?;

        let role = match headers.get(USER_ROLE_HEADER).map(|r| r.to_str()) {
            None => Role::Customer,
            Some(Ok(role)) if role.trim().eq_ignore_ascii_case("customer") => Role::Customer,
            Some(Ok(role)) if role.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            Some(_) => {
                return Err(ApiError::Unauthorized(
                    "Not authorized, invalid role".to_string(),
                ));
            }
        };

        Ok(Some(Self { user_id, role }))
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Principal::from_headers(&parts.headers)?
            .ok_or_else(|| ApiError::Unauthorized("Not authorized, no identity".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Principal::from_headers(&parts.headers)
    }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal =
            <Principal as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(principal))
    }
}
