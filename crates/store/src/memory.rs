use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    Order, Product, ProductPage, ProductQuery, Result, StoreError,
    store::{
        CatalogStore, OrderStore, OrderUpdate, StockReservation, validate_reservations,
    },
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store used by tests and by the server when no database is
/// configured.
///
/// A single write lock covers every commit, so validation and mutation of a
/// commit are never interleaved with another writer.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

fn check_reservation(product: &Product, reservation: &StockReservation) -> Result<()> {
    if product.stock < reservation.quantity {
        return Err(StoreError::InsufficientStock {
            product_id: product.id,
            requested: reservation.quantity,
            available: product.stock,
        });
    }
    if product.version != reservation.expected_version {
        return Err(StoreError::ConcurrencyConflict {
            entity: "product",
            id: product.id.to_string(),
            expected: reservation.expected_version,
            actual: product.version,
        });
    }
    Ok(())
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
    });
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::DuplicateKey {
                entity: "product",
                id: product.id.to_string(),
            });
        }
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let state = self.state.read().await;
        let needle = query.search_needle();

        let mut matching: Vec<&Product> = state
            .products
            .values()
            .filter(|p| query.include_hidden || p.is_visible)
            .filter(|p| query.category.is_none_or(|category| p.category == category))
            .filter(|p| {
                needle
                    .as_deref()
                    .is_none_or(|needle| p.matches_search(needle))
            })
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let products = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ProductPage {
            products,
            page: query.page,
            limit: query.limit,
            total,
        })
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn commit_order(
        &self,
        order: Order,
        reservations: &[StockReservation],
    ) -> Result<Order> {
        validate_reservations(reservations)?;

        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateKey {
                entity: "order",
                id: order.id.to_string(),
            });
        }

        // Validate every reservation before touching any stock
        for reservation in reservations {
            let product = state
                .products
                .get(&reservation.product_id)
                .ok_or(StoreError::ProductNotFound(reservation.product_id))?;
            check_reservation(product, reservation)?;
        }

        let now = Utc::now();
        for reservation in reservations {
            if let Some(product) = state.products.get_mut(&reservation.product_id) {
                product.stock -= reservation.quantity;
                product.version = product.version.next();
                product.updated_at = now;
            }
        }

        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state.orders.values().cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn commit_update(&self, update: &OrderUpdate) -> Result<Order> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let order = state
            .orders
            .get(&update.order_id)
            .ok_or(StoreError::OrderNotFound(update.order_id))?;
        if order.version != update.expected_version {
            return Err(StoreError::ConcurrencyConflict {
                entity: "order",
                id: update.order_id.to_string(),
                expected: update.expected_version,
                actual: order.version,
            });
        }

        for restoration in &update.restock {
            if let Some(product) = state.products.get(&restoration.product_id)
                && product.stock.checked_add(restoration.quantity).is_none()
            {
                return Err(StoreError::InvalidCommit(format!(
                    "Restoring {} units overflows stock of product {}",
                    restoration.quantity, restoration.product_id
                )));
            }
        }

        let now = Utc::now();
        let updated = match state.orders.get_mut(&update.order_id) {
            Some(order) => {
                order.status = update.status;
                order.is_paid = update.is_paid;
                order.version = order.version.next();
                order.updated_at = now;
                order.clone()
            }
            None => return Err(StoreError::OrderNotFound(update.order_id)),
        };

        for restoration in &update.restock {
            match state.products.get_mut(&restoration.product_id) {
                Some(product) => {
                    product.stock += restoration.quantity;
                    product.version = product.version.next();
                    product.updated_at = now;
                }
                None => {
                    tracing::warn!(
                        product_id = %restoration.product_id,
                        order_id = %update.order_id,
                        "product missing during restock, skipped"
                    );
                }
            }
        }

        Ok(updated)
    }
}
