//! Customer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderStatus, ProductId, UserId};
use domain::{CartLine, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::{Order, OrderLineItem, Store};

use super::parse_id;
use crate::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub product: String,
    pub quantity: i64,
}

impl PlaceOrderRequest {
    /// Converts the body into a command for `user_id`.
    ///
    /// Quantities below 1 are passed through as 0 and rejected by the domain.
    pub fn into_command(self, user_id: UserId) -> Result<PlaceOrder, ApiError> {
        let items = self
            .items
            .iter()
            .map(|item| {
                let product_id = parse_id::<ProductId>("product", &item.product)?;
                let quantity = u32::try_from(item.quantity).unwrap_or(0);
                Ok(CartLine::new(product_id, quantity))
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(PlaceOrder::new(
            user_id,
            items,
            self.delivery_address,
            self.phone,
        ))
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItemResponse>,
    pub total_price: Money,
    pub delivery_address: String,
    pub phone: String,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: Option<String>,
}

impl From<OrderLineItem> for OrderItemResponse {
    fn from(item: OrderLineItem) -> Self {
        Self {
            product: item.product_id,
            name: item.name,
            price: item.unit_price,
            quantity: item.quantity,
            image: item.image_ref,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user: order.user_id,
            items: order.items.into_iter().map(Into::into).collect(),
            total_price: order.total_price,
            delivery_address: order.delivery_address,
            phone: order.phone,
            status: order.status,
            is_paid: order.is_paid,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub order: OrderResponse,
}

// -- Handlers --

/// POST /orders: place an order for the caller.
#[tracing::instrument(skip(state, payload), fields(user_id = %principal.user_id))]
pub async fn place<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    principal: Principal,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let Json(req) = payload?;
    let cmd = req.into_command(principal.user_id)?;
    let order = state.orders.place_order(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order: order.into(),
        }),
    ))
}

/// GET /orders/my: the caller's orders, newest first.
#[tracing::instrument(skip(state), fields(user_id = %principal.user_id))]
pub async fn mine<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    principal: Principal,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.orders_for_user(principal.user_id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id}: one order, visible to its owner and to admins.
#[tracing::instrument(skip(state), fields(user_id = %principal.user_id))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let order = state.orders.get_order(order_id).await?;

    if !principal.is_admin() && !order.is_owned_by(principal.user_id) {
        return Err(ApiError::Unauthorized(
            "Not authorized to view this order".to_string(),
        ));
    }

    Ok(Json(order.into()))
}
