//! Order commands.

use common::{OrderId, OrderStatus, ProductId, UserId};

use super::OrderError;

/// One requested cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to place an order for a user.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The user placing the order.
    pub user_id: UserId,

    /// Requested lines, in cart order.
    pub items: Vec<CartLine>,

    pub delivery_address: String,
    pub phone: String,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(
        user_id: UserId,
        items: Vec<CartLine>,
        delivery_address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            items,
            delivery_address: delivery_address.into(),
            phone: phone.into(),
        }
    }

    /// Returns the trimmed delivery address and phone, rejecting blanks.
    pub fn contact(&self) -> Result<(&str, &str), OrderError> {
        let address = self.delivery_address.trim();
        if address.is_empty() {
            return Err(OrderError::MissingDeliveryAddress);
        }
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(OrderError::MissingPhone);
        }
        Ok((address, phone))
    }
}

/// Command to move an order to a new status.
#[derive(Debug, Clone, Copy)]
pub struct ChangeStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl ChangeStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }

    /// Parses the status from its wire name.
    pub fn parse(order_id: OrderId, status: &str) -> Result<Self, OrderError> {
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| OrderError::InvalidStatus(e.0))?;
        Ok(Self::new(order_id, status))
    }
}
