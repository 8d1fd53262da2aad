//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CatalogError, DomainError, OrderError};
use store::StoreError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// Missing or invalid caller identity, or not allowed to see the resource.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated but lacking the required role.
    #[error("{0}")]
    Forbidden(String),
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            OrderError::InvalidStatusTransition { .. } | OrderError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            OrderError::EmptyCart
            | OrderError::InvalidQuantity { .. }
            | OrderError::MissingDeliveryAddress
            | OrderError::MissingPhone
            | OrderError::InsufficientStock { .. }
            | OrderError::InvalidStatus(_)
            | OrderError::TotalOverflow => StatusCode::BAD_REQUEST,
        },
        DomainError::Catalog(catalog_err) => match catalog_err {
            CatalogError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::InvalidCategory(_)
            | CatalogError::MissingName
            | CatalogError::NegativePrice(_) => StatusCode::BAD_REQUEST,
        },
        DomainError::Store(
            StoreError::ConcurrencyConflict { .. }
            | StoreError::TransactionAborted(_)
            | StoreError::DuplicateKey { .. },
        ) => StatusCode::CONFLICT,
        DomainError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };

    let message = match err {
        DomainError::Order(e) => e.to_string(),
        DomainError::Catalog(e) => e.to_string(),
        DomainError::Store(e) => e.to_string(),
    };
    (status, message)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
