//! Shared vocabulary for the storefront order service.

mod category;
mod money;
mod status;
mod types;

pub use category::{Category, ParseCategoryError};
pub use money::Money;
pub use status::{OrderStatus, ParseStatusError};
pub use types::{OrderId, ProductId, UserId};
