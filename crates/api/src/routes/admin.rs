//! Admin-only order and catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{ChangeStatus, CreateProduct};
use serde::Deserialize;
use store::Store;

use super::orders::OrderResponse;
use super::parse_id;
use super::products::ProductResponse;
use crate::AppState;
use crate::auth::AdminPrincipal;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    pub category: String,
    /// Price in cents.
    pub price: i64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl From<CreateProductRequest> for CreateProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            brand: req.brand,
            category: req.category,
            price_cents: req.price,
            stock: req.stock,
            image: req.image,
            is_visible: req.is_visible,
        }
    }
}

/// PUT /admin/order/{id}/status: move an order to a new status.
#[tracing::instrument(skip(state, payload))]
pub async fn set_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminPrincipal,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Json(req) = payload?;
    let order_id = parse_id::<OrderId>("order", &id)?;
    let cmd =
        ChangeStatus::parse(order_id, req.status.trim()).map_err(domain::DomainError::from)?;
    let order = state.orders.set_status(cmd).await?;
    Ok(Json(order.into()))
}

/// PUT /admin/order/{id}/pay: mark an order as paid.
#[tracing::instrument(skip(state))]
pub async fn mark_paid<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let order = state.orders.mark_paid(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /admin/orders: every order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminPrincipal,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.all_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// POST /admin/products: add a product to the catalog.
#[tracing::instrument(skip(state, payload))]
pub async fn create_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminPrincipal,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(req) = payload?;
    let product = state.catalog.create_product(req.into()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}
