use chrono::Utc;
use common::{Category, Money, OrderStatus, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::order::{merge_lines, price_lines};
use domain::{CartLine, ChangeStatus, OrderService, PlaceOrder};
use store::{CatalogStore, InMemoryStore, Product, Version};

fn make_product(name: &str, stock: u32) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(),
        name: name.to_string(),
        description: "Benchmark product".to_string(),
        brand: "Acme".to_string(),
        category: Category::Electronics,
        price: Money::from_cents(1999),
        stock,
        image: None,
        is_visible: true,
        version: Version::first(),
        created_at: now,
        updated_at: now,
    }
}

fn bench_price_lines(c: &mut Criterion) {
    let products: Vec<_> = (0..10)
        .map(|i| (make_product(&format!("SKU-{i}"), 100), 2))
        .collect();
    let lines: Vec<_> = products
        .iter()
        .map(|(p, quantity)| CartLine::new(p.id, *quantity))
        .collect();

    c.bench_function("domain/merge_and_price_10_lines", |b| {
        b.iter(|| {
            let merged = merge_lines(&lines).unwrap();
            assert_eq!(merged.len(), 10);
            price_lines(&products).unwrap()
        });
    });
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::new(InMemoryStore::new());
    let product = rt.block_on(async {
        service
            .store()
            .insert_product(make_product("Bench Widget", u32::MAX))
            .await
            .unwrap()
    });

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .place_order(PlaceOrder::new(
                        UserId::new(),
                        vec![CartLine::new(product.id, 1)],
                        "1 Bench St",
                        "555-0100",
                    ))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/place_then_cancel", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = OrderService::new(InMemoryStore::new());
                let product = service
                    .store()
                    .insert_product(make_product("Bench Widget", 10))
                    .await
                    .unwrap();
                let order = service
                    .place_order(PlaceOrder::new(
                        UserId::new(),
                        vec![CartLine::new(product.id, 3)],
                        "1 Bench St",
                        "555-0100",
                    ))
                    .await
                    .unwrap();
                service
                    .set_status(ChangeStatus::new(order.id, OrderStatus::Cancelled))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_price_lines,
    bench_place_order,
    bench_place_and_cancel
);
criterion_main!(benches);
