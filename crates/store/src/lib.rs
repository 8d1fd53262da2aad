//! Catalog and order persistence.
//!
//! Stock is only ever mutated through the two atomic commit primitives of
//! [`OrderStore`]: a conditional decrement when an order is placed and an
//! increment when an order is cancelled.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;
pub mod version;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, ProductPage, ProductQuery};
pub use record::{Order, OrderLineItem, Product};
pub use store::{
    CatalogStore, OrderStore, OrderUpdate, StockReservation, StockRestoration, Store,
};
pub use version::Version;
