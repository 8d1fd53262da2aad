//! Records persisted by the catalog and order stores.

use chrono::{DateTime, Utc};
use common::{Category, Money, OrderId, OrderStatus, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::Version;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: Category,
    pub price: Money,
    /// Units available for sale. Never negative by construction.
    pub stock: u32,
    pub image: Option<String>,
    /// Hidden products are only returned to admins.
    pub is_visible: bool,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if `needle` (already lowercased) occurs in the name,
    /// description or brand, ignoring case.
    pub fn matches_search(&self, needle: &str) -> bool {
        [&self.name, &self.description, &self.brand]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A product snapshot embedded in an order.
///
/// Captured at placement time; later catalog edits never reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub image_ref: Option<String>,
}

impl OrderLineItem {
    /// Returns `unit_price * quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLineItem>,
    pub total_price: Money,
    pub delivery_address: String,
    pub phone: String,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sums the line totals of the embedded items.
    pub fn line_total_sum(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()?))
    }

    /// Returns true if `user_id` placed this order.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
