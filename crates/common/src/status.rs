//! Order status state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of a placed order.
///
/// Status transitions:
/// ```text
/// Pending ──► Confirmed ──► OutForDelivery ──► Delivered
///    │            │               │                │
///    └────────────┴───────────────┴────────────────┴──► Cancelled
/// ```
///
/// Forward moves may skip intermediate statuses. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, stock reserved, awaiting confirmation.
    #[default]
    Pending,

    /// Accepted by the shop.
    Confirmed,

    /// Handed to the courier.
    OutForDelivery,

    /// Received by the customer.
    Delivered,

    /// Cancelled; stock has been returned to the catalog (terminal state).
    Cancelled,
}

/// Returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status: {0}")]
pub struct ParseStatusError(pub String);

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::OutForDelivery => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    /// Returns true if the order can move from this status to `next`.
    ///
    /// Staying on the same status is not a transition and returns false.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, OrderStatus::Cancelled) => true,
            (current, next) => next.rank() > current.rank(),
        }
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
