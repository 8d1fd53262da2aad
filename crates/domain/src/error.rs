//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order rule was violated.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// A catalog rule was violated.
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    /// The store failed for a reason the domain does not interpret.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}

impl From<CatalogError> for DomainError {
    fn from(e: CatalogError) -> Self {
        DomainError::Catalog(e)
    }
}
