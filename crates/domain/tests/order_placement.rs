//! Integration tests for order placement and status transitions.
//!
//! These run the services against the in-memory store and cover the stock
//! invariants under sequential and concurrent use.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{Category, Money, OrderStatus, ProductId, UserId};
use domain::{
    CartLine, ChangeStatus, DomainError, OrderError, OrderService, PlaceOrder, RetryPolicy,
};
use futures_util::future::join_all;
use store::{CatalogStore, InMemoryStore, Order, OrderLineItem, Product, Version};

/// Helper to create a test order service
fn create_service() -> OrderService<InMemoryStore> {
    OrderService::new(InMemoryStore::new())
}

async fn seed(
    service: &OrderService<InMemoryStore>,
    name: &str,
    price_cents: i64,
    stock: u32,
) -> Product {
    let now = Utc::now();
    service
        .store()
        .insert_product(Product {
            id: ProductId::new(),
            name: name.to_string(),
            description: format!("{name} description"),
            brand: "Acme".to_string(),
            category: Category::Electronics,
            price: Money::from_cents(price_cents),
            stock,
            image: Some(format!("img/{name}.png")),
            is_visible: true,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

async fn stock_of(service: &OrderService<InMemoryStore>, id: ProductId) -> u32 {
    service.store().get_product(id).await.unwrap().unwrap().stock
}

fn order_of(user_id: UserId, lines: &[(ProductId, u32)]) -> PlaceOrder {
    PlaceOrder::new(
        user_id,
        lines.iter().map(|(id, q)| CartLine::new(*id, *q)).collect(),
        "1 Main St",
        "555-0100",
    )
}

fn assert_total_matches_lines(order: &Order) {
    let sum: Money = order
        .items
        .iter()
        .filter_map(OrderLineItem::line_total)
        .sum();
    assert_eq!(sum, order.total_price);
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn places_order_and_decrements_stock() {
        let service = create_service();
        let p1 = seed(&service, "P1", 10, 5).await;

        let order = service
            .place_order(order_of(UserId::new(), &[(p1.id, 2)]))
            .await
            .unwrap();

        assert_eq!(order.total_price, Money::from_cents(20));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_paid);
        assert_eq!(stock_of(&service, p1.id).await, 3);
        assert_total_matches_lines(&order);
    }

    #[tokio::test]
    async fn quantity_above_stock_leaves_stock_unchanged() {
        let service = create_service();
        let p1 = seed(&service, "P1", 10, 5).await;

        let result = service
            .place_order(order_of(UserId::new(), &[(p1.id, 6)]))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InsufficientStock { ref product_name, requested: 6, available: 5 }))
                if product_name == "P1"
        ));
        assert_eq!(stock_of(&service, p1.id).await, 5);
        assert_eq!(service.store().order_count().await, 0);
    }

    #[tokio::test]
    async fn failing_later_line_leaves_earlier_stock_untouched() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let b = seed(&service, "B", 100, 1).await;

        let result = service
            .place_order(order_of(UserId::new(), &[(a.id, 2), (b.id, 2)]))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InsufficientStock { .. }))
        ));
        assert_eq!(stock_of(&service, a.id).await, 5);
        assert_eq!(stock_of(&service, b.id).await, 1);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let missing = ProductId::new();

        let result = service
            .place_order(order_of(UserId::new(), &[(a.id, 1), (missing, 1)]))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::ProductNotFound(id))) if id == missing
        ));
        assert_eq!(stock_of(&service, a.id).await, 5);
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let user = UserId::new();

        let empty = service.place_order(order_of(user, &[])).await;
        assert!(matches!(empty, Err(DomainError::Order(OrderError::EmptyCart))));

        let zero = service.place_order(order_of(user, &[(a.id, 0)])).await;
        assert!(matches!(
            zero,
            Err(DomainError::Order(OrderError::InvalidQuantity { .. }))
        ));

        let mut no_address = order_of(user, &[(a.id, 1)]);
        no_address.delivery_address = "  ".to_string();
        assert!(matches!(
            service.place_order(no_address).await,
            Err(DomainError::Order(OrderError::MissingDeliveryAddress))
        ));

        let mut no_phone = order_of(user, &[(a.id, 1)]);
        no_phone.phone = String::new();
        assert!(matches!(
            service.place_order(no_phone).await,
            Err(DomainError::Order(OrderError::MissingPhone))
        ));

        assert_eq!(stock_of(&service, a.id).await, 5);
    }

    #[tokio::test]
    async fn duplicate_lines_are_merged() {
        let service = create_service();
        let a = seed(&service, "A", 250, 5).await;

        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 1), (a.id, 2)]))
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.total_price, Money::from_cents(750));
        assert_eq!(stock_of(&service, a.id).await, 2);
    }

    #[tokio::test]
    async fn line_items_are_snapshots() {
        let service = create_service();
        let a = seed(&service, "A", 250, 5).await;

        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 1)]))
            .await
            .unwrap();

        assert_eq!(order.items[0].name, "A");
        assert_eq!(order.items[0].unit_price, Money::from_cents(250));
        assert_eq!(order.items[0].image_ref.as_deref(), Some("img/A.png"));
        assert_eq!(order.delivery_address, "1 Main St");
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() {
        let service = create_service();
        let a = seed(&service, "A", 100, 10).await;
        let user = UserId::new();

        let first = service.place_order(order_of(user, &[(a.id, 1)])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = service.place_order(order_of(user, &[(a.id, 1)])).await.unwrap();
        service
            .place_order(order_of(UserId::new(), &[(a.id, 1)]))
            .await
            .unwrap();

        let mine = service.orders_for_user(user).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert_eq!(service.all_orders().await.unwrap().len(), 3);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_unit_is_sold_exactly_once() {
        let service = Arc::new(create_service());
        let p = seed(&service, "Last One", 500, 1).await;
        let product_id = p.id;

        let tasks = (0..2).map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .place_order(order_of(UserId::new(), &[(product_id, 1)]))
                    .await
            })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(DomainError::Order(OrderError::InsufficientStock { .. }))
                )
            })
            .count();
        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(stock_of(&service, p.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stock_never_goes_negative_under_contention() {
        let service = Arc::new(OrderService::with_retry_policy(
            InMemoryStore::new(),
            RetryPolicy::new(20, Duration::from_millis(1)),
        ));
        let p = seed(&service, "Popular", 100, 10).await;
        let product_id = p.id;

        let tasks = (0..25).map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .place_order(order_of(UserId::new(), &[(product_id, 1)]))
                    .await
            })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let placed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(placed.len(), 10);
        for order in &placed {
            assert_total_matches_lines(order);
        }
        assert_eq!(stock_of(&service, p.id).await, 0);
        assert_eq!(service.store().order_count().await, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cancels_restore_stock_once() {
        let service = Arc::new(create_service());
        let p = seed(&service, "Lamp", 100, 5).await;
        let order = service
            .place_order(order_of(UserId::new(), &[(p.id, 3)]))
            .await
            .unwrap();
        let order_id = order.id;

        let tasks = (0..4).map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .set_status(ChangeStatus::new(order_id, OrderStatus::Cancelled))
                    .await
            })
        });
        for result in join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap().status, OrderStatus::Cancelled);
        }

        assert_eq!(stock_of(&service, p.id).await, 5);
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn cancelling_restores_every_line() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let b = seed(&service, "B", 200, 4).await;

        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 2), (b.id, 3)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&service, a.id).await, 3);
        assert_eq!(stock_of(&service, b.id).await, 1);

        let cancelled = service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Cancelled))
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&service, a.id).await, 5);
        assert_eq!(stock_of(&service, b.id).await, 4);
    }

    #[tokio::test]
    async fn second_cancel_is_a_no_op() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 2)]))
            .await
            .unwrap();

        let first = service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Cancelled))
            .await
            .unwrap();
        let second = service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Cancelled))
            .await
            .unwrap();

        assert_eq!(first.version, second.version);
        assert_eq!(stock_of(&service, a.id).await, 5);
    }

    #[tokio::test]
    async fn forward_transitions_keep_stock() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 2)]))
            .await
            .unwrap();

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            let updated = service
                .set_status(ChangeStatus::new(order.id, next))
                .await
                .unwrap();
            assert_eq!(updated.status, next);
        }

        assert_eq!(stock_of(&service, a.id).await, 3);
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 1)]))
            .await
            .unwrap();

        service
            .set_status(ChangeStatus::new(order.id, OrderStatus::OutForDelivery))
            .await
            .unwrap();
        let backward = service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Confirmed))
            .await;
        assert!(matches!(
            backward,
            Err(DomainError::Order(OrderError::InvalidStatusTransition { .. }))
        ));

        service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Cancelled))
            .await
            .unwrap();
        let revived = service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Pending))
            .await;
        assert!(matches!(
            revived,
            Err(DomainError::Order(OrderError::InvalidStatusTransition { .. }))
        ));
        assert_eq!(stock_of(&service, a.id).await, 5);
    }

    #[tokio::test]
    async fn cancelled_order_cannot_be_paid() {
        let service = create_service();
        let a = seed(&service, "A", 100, 5).await;
        let order = service
            .place_order(order_of(UserId::new(), &[(a.id, 1)]))
            .await
            .unwrap();
        service
            .set_status(ChangeStatus::new(order.id, OrderStatus::Cancelled))
            .await
            .unwrap();

        assert!(service.mark_paid(order.id).await.is_err());
    }
}
