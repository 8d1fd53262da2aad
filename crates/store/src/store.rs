use std::collections::HashSet;

use async_trait::async_trait;
use common::{OrderId, OrderStatus, ProductId, UserId};

use crate::{Order, Product, ProductPage, ProductQuery, Result, StoreError, Version};

/// A conditional stock decrement requested as part of an order commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Product version the caller priced against.
    pub expected_version: Version,
}

/// Units returned to the catalog when an order is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRestoration {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A guarded mutation of an order's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    /// Order version the caller decided against.
    pub expected_version: Version,
    pub status: OrderStatus,
    pub is_paid: bool,
    /// Stock returned in the same commit as the order write.
    pub restock: Vec<StockRestoration>,
}

/// Catalog persistence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a new product.
    async fn insert_product(&self, product: Product) -> Result<Product>;

    /// Retrieves a product by id, visible or not.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Retrieves one page of products matching a query, newest first.
    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage>;
}

/// Order persistence and the stock mutations tied to it.
///
/// Both commit methods are atomic: either every stock change and the order
/// write succeed, or nothing is changed.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Decrements stock for every reservation and inserts the order.
    ///
    /// Each decrement is conditional on `stock >= quantity` and on the product
    /// still being at `expected_version`. Fails with `InsufficientStock`,
    /// `ProductNotFound` or `ConcurrencyConflict` without side effects.
    async fn commit_order(&self, order: Order, reservations: &[StockReservation])
    -> Result<Order>;

    /// Retrieves an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Lists every order, newest first.
    async fn all_orders(&self) -> Result<Vec<Order>>;

    /// Writes status and payment flag, then applies the restock lines.
    ///
    /// Fails with `ConcurrencyConflict` if the order is no longer at
    /// `expected_version`. Returns the order as written.
    async fn commit_update(&self, update: &OrderUpdate) -> Result<Order>;
}

/// Everything the services need from a backing store.
pub trait Store: CatalogStore + OrderStore + Clone + 'static {}

impl<T: CatalogStore + OrderStore + Clone + 'static> Store for T {}

/// Validates reservations before committing.
pub fn validate_reservations(reservations: &[StockReservation]) -> Result<()> {
    if reservations.is_empty() {
        return Err(StoreError::InvalidCommit(
            "Cannot commit an order without reservations".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(reservations.len());
    for reservation in reservations {
        if reservation.quantity == 0 {
            return Err(StoreError::InvalidCommit(format!(
                "Reservation for product {} has zero quantity",
                reservation.product_id
            )));
        }
        if !seen.insert(reservation.product_id) {
            return Err(StoreError::InvalidCommit(format!(
                "Product {} is reserved more than once",
                reservation.product_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(product_id: ProductId, quantity: u32) -> StockReservation {
        StockReservation {
            product_id,
            quantity,
            expected_version: Version::first(),
        }
    }

    #[test]
    fn rejects_empty_reservations() {
        assert!(matches!(
            validate_reservations(&[]),
            Err(StoreError::InvalidCommit(_))
        ));
    }

    #[test]
    fn rejects_zero_quantity() {
        let result = validate_reservations(&[reservation(ProductId::new(), 0)]);
        assert!(matches!(result, Err(StoreError::InvalidCommit(_))));
    }

    #[test]
    fn rejects_duplicate_products() {
        let id = ProductId::new();
        let result = validate_reservations(&[reservation(id, 1), reservation(id, 2)]);
        assert!(matches!(result, Err(StoreError::InvalidCommit(_))));
    }

    #[test]
    fn accepts_distinct_products() {
        let result =
            validate_reservations(&[reservation(ProductId::new(), 1), reservation(ProductId::new(), 3)]);
        assert!(result.is_ok());
    }
}
