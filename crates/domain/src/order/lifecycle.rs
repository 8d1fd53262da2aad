//! Guarded updates of a placed order.

use common::OrderStatus;
use store::{Order, OrderUpdate, StockRestoration};

use super::OrderError;

/// Plans a status change against the order as read.
///
/// Returns `None` when the order already has `next`, so repeating a
/// cancellation never restores stock twice. Cancelling returns every line's
/// units to stock in the same update.
pub fn plan_status_change(
    order: &Order,
    next: OrderStatus,
) -> Result<Option<OrderUpdate>, OrderError> {
    if order.status == next {
        return Ok(None);
    }
    if !order.status.can_transition_to(next) {
        return Err(OrderError::InvalidStatusTransition {
            from: order.status,
            to: next,
        });
    }

    let restock = if next == OrderStatus::Cancelled {
        order
            .items
            .iter()
            .map(|item| StockRestoration {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(Some(OrderUpdate {
        order_id: order.id,
        expected_version: order.version,
        status: next,
        is_paid: order.is_paid,
        restock,
    }))
}

/// Plans marking an order as paid. Already-paid orders need no update.
pub fn plan_payment(order: &Order) -> Result<Option<OrderUpdate>, OrderError> {
    if order.is_paid {
        return Ok(None);
    }
    if order.status.is_terminal() {
        return Err(OrderError::InvalidStatusTransition {
            from: order.status,
            to: order.status,
        });
    }

    Ok(Some(OrderUpdate {
        order_id: order.id,
        expected_version: order.version,
        status: order.status,
        is_paid: true,
        restock: Vec::new(),
    }))
}
