//! Domain layer for the storefront order service.
//!
//! This crate provides:
//! - Order placement with all-or-nothing stock reservation
//! - Order status transitions, with stock restored on cancellation
//! - Catalog listing with visibility rules
//! - Bounded retry of optimistic concurrency conflicts

pub mod catalog;
pub mod error;
pub mod order;
pub mod retry;

pub use catalog::{CatalogError, CatalogService, CreateProduct, ListProducts};
pub use error::DomainError;
pub use order::{CartLine, ChangeStatus, OrderError, OrderService, PlaceOrder, PricedOrder};
pub use retry::RetryPolicy;
