//! Product catalog reads and admin writes.

mod commands;
mod service;

pub use commands::{CreateProduct, ListProducts};
pub use service::CatalogService;

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The category is not one of the known categories.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Product name is blank.
    #[error("Product name is required")]
    MissingName,

    /// Price is below zero.
    #[error("Invalid price: {0} (must not be negative)")]
    NegativePrice(i64),

    /// The product does not exist, or is hidden from the caller.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
}
