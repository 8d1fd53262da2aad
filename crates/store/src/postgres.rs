use async_trait::async_trait;
use chrono::Utc;
use common::{Category, Money, OrderId, OrderStatus, ProductId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Order, OrderLineItem, Product, ProductPage, ProductQuery, Result, StoreError, Version,
    store::{
        CatalogStore, OrderStore, OrderUpdate, StockReservation, validate_reservations,
    },
};

const PRODUCT_COLUMNS: &str = "id, name, description, brand, category, price_cents, stock, image, is_visible, version, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, items, total_price_cents, delivery_address, phone, status, is_paid, version, created_at, updated_at";

/// PostgreSQL-backed catalog and order store.
///
/// Commits run inside one transaction. Stock decrements are conditional
/// `UPDATE`s, so concurrent writers serialize on the product row and a
/// decrement that no longer fits aborts the whole commit.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let category: String = row.try_get("category")?;

        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            brand: row.try_get("brand")?,
            category: category
                .parse::<Category>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: decode_count(row.try_get("stock")?)?,
            image: row.try_get("image")?,
            is_visible: row.try_get("is_visible")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<OrderLineItem> = serde_json::from_value(items_json)?;
        let status: String = row.try_get("status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            delivery_address: row.try_get("delivery_address")?,
            phone: row.try_get("phone")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            is_paid: row.try_get("is_paid")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Works out why a conditional decrement matched no row.
    async fn rejected_reservation(
        tx: &mut Transaction<'_, Postgres>,
        reservation: &StockReservation,
    ) -> StoreError {
        let row: Option<(i64, i64)> =
            match sqlx::query_as("SELECT stock, version FROM products WHERE id = $1")
                .bind(reservation.product_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await
            {
                Ok(row) => row,
                Err(e) => return StoreError::Database(e),
            };

        match row {
            None => StoreError::ProductNotFound(reservation.product_id),
            Some((stock, _)) if stock < i64::from(reservation.quantity) => {
                StoreError::InsufficientStock {
                    product_id: reservation.product_id,
                    requested: reservation.quantity,
                    available: u32::try_from(stock).unwrap_or(0),
                }
            }
            Some((_, version)) => StoreError::ConcurrencyConflict {
                entity: "product",
                id: reservation.product_id.to_string(),
                expected: reservation.expected_version,
                actual: Version::new(version),
            },
        }
    }
}

fn decode_count(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("count out of range: {value}")))
}

/// Escapes `LIKE` wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_product_filter(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");
    if !query.include_hidden {
        builder.push(" AND is_visible");
    }
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// SQLSTATE codes for transactions PostgreSQL aborts in favour of a
/// concurrent writer.
const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";

/// Turns deadlock and serialization aborts into a retryable conflict.
fn map_transaction_abort(err: StoreError) -> StoreError {
    if let StoreError::Database(sqlx::Error::Database(ref db_err)) = err
        && let Some(code) = db_err.code()
        && matches!(&*code, DEADLOCK_DETECTED | SERIALIZATION_FAILURE)
    {
        return StoreError::TransactionAborted(db_err.message().to_string());
    }
    err
}

/// Orders row mutations by product id so concurrent commits lock the same
/// rows in the same sequence.
fn in_lock_order<T>(items: &[T], key: impl Fn(&T) -> ProductId) -> Vec<&T> {
    let mut ordered: Vec<&T> = items.iter().collect();
    ordered.sort_by_key(|item| key(*item));
    ordered
}

fn map_unique_violation(e: sqlx::Error, entity: &'static str, id: String) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::DuplicateKey { entity, id };
    }
    StoreError::Database(e)
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, brand, category, price_cents, stock, image, is_visible, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.brand)
        .bind(product.category.as_str())
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .bind(&product.image)
        .bind(product.is_visible)
        .bind(product.version.as_i64())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product", product.id.to_string()))?;

        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filter(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_product_filter(&mut select, query);
        select
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows = select.build().fetch_all(&self.pool).await?;
        let products = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductPage {
            products,
            page: query.page,
            limit: query.limit,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn commit_order(
        &self,
        order: Order,
        reservations: &[StockReservation],
    ) -> Result<Order> {
        validate_reservations(reservations)?;

        self.try_commit_order(order, &in_lock_order(reservations, |r| r.product_id))
            .await
            .map_err(map_transaction_abort)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn commit_update(&self, update: &OrderUpdate) -> Result<Order> {
        self.try_commit_update(update)
            .await
            .map_err(map_transaction_abort)
    }
}

impl PostgresStore {
    async fn try_commit_order(
        &self,
        order: Order,
        reservations: &[&StockReservation],
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for reservation in reservations.iter().copied() {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, version = version + 1, updated_at = $4
                WHERE id = $1 AND stock >= $2 AND version = $3
                "#,
            )
            .bind(reservation.product_id.as_uuid())
            .bind(i64::from(reservation.quantity))
            .bind(reservation.expected_version.as_i64())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back earlier decrements
                return Err(Self::rejected_reservation(&mut tx, reservation).await);
            }
        }

        let items_json = serde_json::to_value(&order.items)?;
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_price_cents, delivery_address, phone, status, is_paid, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(items_json)
        .bind(order.total_price.cents())
        .bind(&order.delivery_address)
        .bind(&order.phone)
        .bind(order.status.as_str())
        .bind(order.is_paid)
        .bind(order.version.as_i64())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "order", order.id.to_string()))?;

        tx.commit().await?;
        Ok(order)
    }

    async fn try_commit_update(&self, update: &OrderUpdate) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET status = $2, is_paid = $3, version = version + 1, updated_at = $5
            WHERE id = $1 AND version = $4
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(update.order_id.as_uuid())
        .bind(update.status.as_str())
        .bind(update.is_paid)
        .bind(update.expected_version.as_i64())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(update.order_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match actual {
                None => StoreError::OrderNotFound(update.order_id),
                Some(version) => StoreError::ConcurrencyConflict {
                    entity: "order",
                    id: update.order_id.to_string(),
                    expected: update.expected_version,
                    actual: Version::new(version),
                },
            });
        };
        let order = Self::row_to_order(row)?;

        for restoration in in_lock_order(&update.restock, |r| r.product_id) {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + $2, version = version + 1, updated_at = $3
                WHERE id = $1
                "#,
            )
            .bind(restoration.product_id.as_uuid())
            .bind(i64::from(restoration.quantity))
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::warn!(
                    product_id = %restoration.product_id,
                    order_id = %update.order_id,
                    "product missing during restock, skipped"
                );
            }
        }

        tx.commit().await?;
        Ok(order)
    }
}
