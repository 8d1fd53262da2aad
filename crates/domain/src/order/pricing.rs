//! Cart normalization and line-item snapshots.

use common::Money;
use store::{OrderLineItem, Product, StockReservation};

use super::{CartLine, OrderError};

/// Line items, total and stock reservations derived from one catalog read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub items: Vec<OrderLineItem>,
    pub total_price: Money,
    pub reservations: Vec<StockReservation>,
}

/// Validates cart lines and merges lines naming the same product.
///
/// Merged lines keep the position of their first occurrence.
pub fn merge_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id,
            });
        }
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or(
                    OrderError::InvalidQuantity {
                        product_id: line.product_id,
                    },
                )?;
            }
            None => merged.push(*line),
        }
    }

    Ok(merged)
}

/// Checks stock and snapshots each product at its current price.
///
/// Nothing is mutated here; the reservations carry the versions read so the
/// commit can detect a catalog change in between.
pub fn price_lines(lines: &[(Product, u32)]) -> Result<PricedOrder, OrderError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut reservations = Vec::with_capacity(lines.len());
    let mut total_price = Money::zero();

    for (product, quantity) in lines {
        if product.stock < *quantity {
            return Err(OrderError::InsufficientStock {
                product_name: product.name.clone(),
                requested: *quantity,
                available: product.stock,
            });
        }

        let item = OrderLineItem {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: *quantity,
            image_ref: product.image.clone(),
        };
        total_price = item
            .line_total()
            .and_then(|line_total| total_price.checked_add(line_total))
            .ok_or(OrderError::TotalOverflow)?;

        reservations.push(StockReservation {
            product_id: product.id,
            quantity: *quantity,
            expected_version: product.version,
        });
        items.push(item);
    }

    Ok(PricedOrder {
        items,
        total_price,
        reservations,
    })
}
