//! Order service coordinating placement and status changes with the store.

use std::time::Instant;

use chrono::Utc;
use common::{OrderId, OrderStatus, ProductId, UserId};
use metrics::{counter, histogram};
use store::{Order, OrderUpdate, Product, Store, StoreError, Version};

use crate::error::DomainError;
use crate::retry::RetryPolicy;

use super::{
    ChangeStatus, OrderError, PlaceOrder, merge_lines, plan_payment, plan_status_change,
    price_lines,
};

/// Service for placing and managing orders.
///
/// Every stock mutation goes through one atomic store commit guarded by the
/// versions read beforehand. A commit that loses a race is retried from a
/// fresh read according to the retry policy.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
    retry: RetryPolicy,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the default retry policy.
    pub fn new(store: S) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    /// Creates a new order service with a custom retry policy.
    pub fn with_retry_policy(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order, reserving stock for every line.
    ///
    /// Either every line's stock is decremented and the order is stored, or
    /// nothing changes.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, lines = cmd.items.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let started = Instant::now();
        let result = self.try_place_order(&cmd).await;
        histogram!("order_placement_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total_cents = order.total_price.cents(),
                    "Order placed"
                );
            }
            Err(e) => {
                counter!("order_placement_rejected_total", "reason" => rejection_reason(e))
                    .increment(1);
                tracing::debug!(error = %e, "Order rejected");
            }
        }

        result
    }

    async fn try_place_order(&self, cmd: &PlaceOrder) -> Result<Order, DomainError> {
        let (delivery_address, phone) = cmd.contact()?;
        let lines = merge_lines(&cmd.items)?;
        let order_id = OrderId::new();

        let mut attempt = 1;
        loop {
            let mut products = Vec::with_capacity(lines.len());
            for line in &lines {
                products.push((self.orderable_product(line.product_id).await?, line.quantity));
            }
            let priced = price_lines(&products)?;

            let now = Utc::now();
            let order = Order {
                id: order_id,
                user_id: cmd.user_id,
                items: priced.items,
                total_price: priced.total_price,
                delivery_address: delivery_address.to_string(),
                phone: phone.to_string(),
                status: OrderStatus::Pending,
                is_paid: false,
                version: Version::first(),
                created_at: now,
                updated_at: now,
            };

            match self.store.commit_order(order, &priced.reservations).await {
                Ok(order) => return Ok(order),
                Err(e) if e.is_conflict() => {
                    counter!("order_placement_conflicts_total").increment(1);
                    self.backoff_or_give_up(attempt, &e).await?;
                    attempt += 1;
                }
                Err(e) => return Err(placement_error(e, &products)),
            }
        }
    }

    /// Loads a product that may be ordered. Hidden products count as unknown.
    async fn orderable_product(&self, id: ProductId) -> Result<Product, DomainError> {
        match self.store.get_product(id).await? {
            Some(product) if product.is_visible => Ok(product),
            _ => Err(OrderError::ProductNotFound(id).into()),
        }
    }

    /// Sleeps before the next attempt, or fails with `Conflict` once the
    /// retry budget is spent.
    async fn backoff_or_give_up(&self, attempt: u32, error: &StoreError) -> Result<(), DomainError> {
        if !self.retry.should_retry(attempt) {
            tracing::warn!(attempt, error = %error, "Giving up after repeated conflicts");
            return Err(OrderError::Conflict { attempts: attempt }.into());
        }
        tracing::warn!(attempt, error = %error, "Commit conflicted, retrying");
        tokio::time::sleep(self.retry.delay_after(attempt)).await;
        Ok(())
    }

    /// Moves an order to a new status.
    ///
    /// Setting the current status again returns the order unchanged.
    /// Cancelling restores every line's stock in the same commit.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, cmd: ChangeStatus) -> Result<Order, DomainError> {
        let next = cmd.status;
        let (order, changed) = self
            .update_order(cmd.order_id, |order| plan_status_change(order, next))
            .await?;

        if changed {
            counter!("order_status_changes_total", "status" => next.as_str()).increment(1);
            if next == OrderStatus::Cancelled {
                let restored: u64 = order.items.iter().map(|i| u64::from(i.quantity)).sum();
                counter!("stock_restored_units_total").increment(restored);
            }
            tracing::info!(order_id = %order.id, status = %next, "Order status changed");
        }

        Ok(order)
    }

    /// Marks an order as paid.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let (order, changed) = self.update_order(order_id, plan_payment).await?;
        if changed {
            tracing::info!(order_id = %order.id, "Order marked paid");
        }
        Ok(order)
    }

    /// Reads an order, plans an update and commits it, retrying on conflict.
    ///
    /// Returns the order and whether anything was written.
    async fn update_order<F>(&self, order_id: OrderId, plan: F) -> Result<(Order, bool), DomainError>
    where
        F: Fn(&Order) -> Result<Option<OrderUpdate>, OrderError>,
    {
        let mut attempt = 1;
        loop {
            let order = self
                .store
                .get_order(order_id)
                .await?
                .ok_or(OrderError::OrderNotFound(order_id))?;

            let Some(update) = plan(&order)? else {
                return Ok((order, false));
            };

            match self.store.commit_update(&update).await {
                Ok(order) => return Ok((order, true)),
                Err(e) if e.is_conflict() => {
                    self.backoff_or_give_up(attempt, &e).await?;
                    attempt += 1;
                }
                Err(StoreError::OrderNotFound(id)) => {
                    return Err(OrderError::OrderNotFound(id).into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id).into())
    }

    /// Lists a user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Lists every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.all_orders().await?)
    }
}

/// Maps a non-conflict commit failure onto the order taxonomy.
fn placement_error(error: StoreError, products: &[(Product, u32)]) -> DomainError {
    match error {
        StoreError::InsufficientStock {
            product_id,
            requested,
            available,
        } => {
            let product_name = products
                .iter()
                .find(|(p, _)| p.id == product_id)
                .map(|(p, _)| p.name.clone())
                .unwrap_or_else(|| product_id.to_string());
            OrderError::InsufficientStock {
                product_name,
                requested,
                available,
            }
            .into()
        }
        StoreError::ProductNotFound(id) => OrderError::ProductNotFound(id).into(),
        other => other.into(),
    }
}

fn rejection_reason(error: &DomainError) -> &'static str {
    match error {
        DomainError::Order(e) => e.reason(),
        DomainError::Catalog(_) => "catalog",
        DomainError::Store(_) => "store",
    }
}
