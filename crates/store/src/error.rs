use common::{OrderId, ProductId};
use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the catalog or order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A conditional stock decrement found fewer units than requested.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The record changed since it was read.
    #[error("Concurrency conflict for {entity} {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        entity: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The database aborted the transaction in favour of a concurrent writer.
    #[error("Transaction aborted by a concurrent writer: {0}")]
    TransactionAborted(String),

    /// A record with the same key already exists.
    #[error("Duplicate {entity}: {id}")]
    DuplicateKey { entity: &'static str, id: String },

    /// The commit request itself is malformed.
    #[error("Invalid commit: {0}")]
    InvalidCommit(String),

    /// A stored value could not be mapped back onto a record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for optimistic concurrency failures worth retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::ConcurrencyConflict { .. } | StoreError::TransactionAborted(_)
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
