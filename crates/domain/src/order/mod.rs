//! Order placement and lifecycle.

mod commands;
mod lifecycle;
mod pricing;
mod service;

pub use commands::{CartLine, ChangeStatus, PlaceOrder};
pub use lifecycle::{plan_payment, plan_status_change};
pub use pricing::{PricedOrder, merge_lines, price_lines};
pub use service::OrderService;

use common::{OrderId, OrderStatus, ProductId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("Order has no items")]
    EmptyCart,

    /// A cart line asks for zero units, or merged quantities overflow.
    #[error("Invalid quantity for product {product_id}: must be at least 1")]
    InvalidQuantity { product_id: ProductId },

    /// Delivery address is blank.
    #[error("Delivery address is required")]
    MissingDeliveryAddress,

    /// Phone number is blank.
    #[error("Phone number is required")]
    MissingPhone,

    /// The product does not exist or is not for sale.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Not enough units in stock.
    #[error("Insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The status name is not one of the known statuses.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// The order cannot move from its current status to the requested one.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Concurrent writers kept winning until the retry budget ran out.
    #[error("Order could not be committed after {attempts} attempts due to concurrent updates")]
    Conflict { attempts: u32 },

    /// The order total does not fit in the money representation.
    #[error("Order total is too large")]
    TotalOverflow,
}

impl OrderError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::EmptyCart => "empty_cart",
            OrderError::InvalidQuantity { .. } => "invalid_quantity",
            OrderError::MissingDeliveryAddress => "missing_delivery_address",
            OrderError::MissingPhone => "missing_phone",
            OrderError::ProductNotFound(_) => "product_not_found",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::OrderNotFound(_) => "order_not_found",
            OrderError::InvalidStatus(_) => "invalid_status",
            OrderError::InvalidStatusTransition { .. } => "invalid_status_transition",
            OrderError::Conflict { .. } => "conflict",
            OrderError::TotalOverflow => "total_overflow",
        }
    }
}
