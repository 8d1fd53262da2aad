//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use store::{ProductQuery, Store, StoreError};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: reports whether the store answers a trivial read.
pub async fn check<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    let probe = ProductQuery::new().include_hidden(true).limit(1);
    health_response(state.catalog.store().query_products(&probe).await.err())
}

/// Store failures are logged, never echoed to the caller.
fn health_response(failure: Option<StoreError>) -> (StatusCode, Json<HealthResponse>) {
    match failure {
        None => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Some(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}
