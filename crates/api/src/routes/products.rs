//! Public catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::{Category, Money, ProductId};
use domain::ListProducts;
use serde::{Deserialize, Serialize};
use store::{Product, ProductPage, Store};

use super::parse_id;
use crate::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ProductListParams> for ListProducts {
    fn from(params: ProductListParams) -> Self {
        Self {
            category: params.category,
            search: params.search,
            page: params.page,
            limit: params.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: Category,
    pub price: Money,
    pub stock: u32,
    pub image: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            brand: product.brand,
            category: product.category,
            price: product.price,
            stock: product.stock,
            image: product.image,
            is_visible: product.is_visible,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageResponse {
    pub products: Vec<ProductResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<ProductPage> for ProductPageResponse {
    fn from(page: ProductPage) -> Self {
        let total_pages = page.total_pages();
        Self {
            products: page.products.into_iter().map(Into::into).collect(),
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages,
        }
    }
}

fn is_admin(principal: Option<Principal>) -> bool {
    principal.is_some_and(|p| p.is_admin())
}

/// GET /products: filtered, paginated catalog listing.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    principal: Option<Principal>,
    params: Result<Query<ProductListParams>, QueryRejection>,
) -> Result<Json<ProductPageResponse>, ApiError> {
    let Query(params) = params?;
    let page = state
        .catalog
        .list_products(&params.into(), is_admin(principal))
        .await?;
    Ok(Json(page.into()))
}

/// GET /products/{id}: one product; hidden products only for admins.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    principal: Option<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id::<ProductId>("product", &id)?;
    let product = state
        .catalog
        .get_product(product_id, is_admin(principal))
        .await?;
    Ok(Json(product.into()))
}
