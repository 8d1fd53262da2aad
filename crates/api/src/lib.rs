//! HTTP API server with observability for the storefront order service.
//!
//! Provides REST endpoints for order placement, order administration and
//! catalog browsing, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{CatalogService, OrderService, RetryPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders/my", get(routes::orders::mine::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/admin/order/{id}/status",
            put(routes::admin::set_status::<S>),
        )
        .route("/admin/order/{id}/pay", put(routes::admin::mark_paid::<S>))
        .route("/admin/orders", get(routes::admin::list_orders::<S>))
        .route(
            "/admin/products",
            post(routes::admin::create_product::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store.
pub fn create_state<S: Store>(store: S, retry: RetryPolicy) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orders: OrderService::with_retry_policy(store.clone(), retry),
        catalog: CatalogService::new(store),
    })
}
