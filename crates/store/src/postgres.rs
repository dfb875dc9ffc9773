use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use domain::{NewOrder, Order, OrderItem, OrderStatus, Product};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{Result, StoreError, store::OrderStore};

/// PostgreSQL-backed store implementation.
///
/// Each compound operation runs inside one transaction and locks the
/// rows it is about to mutate with `SELECT ... FOR UPDATE`, so two
/// concurrent reservations (or a complete racing a cancel) serialize on
/// the same rows and at most one observes the precondition as satisfied.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                price_cents BIGINT NOT NULL,
                currency    TEXT NOT NULL,
                category    TEXT NOT NULL DEFAULT '',
                stock       BIGINT NOT NULL CHECK (stock >= 0),
                created_at  TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id           BIGSERIAL PRIMARY KEY,
                product_id   TEXT NOT NULL,
                amount_cents BIGINT NOT NULL,
                status       TEXT NOT NULL,
                created_at   TIMESTAMPTZ NOT NULL,
                completed_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS order_items (
                id               BIGSERIAL PRIMARY KEY,
                order_id         BIGINT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id       TEXT NOT NULL,
                product_name     TEXT NOT NULL,
                quantity         BIGINT NOT NULL,
                unit_price_cents BIGINT NOT NULL,
                total_price_cents BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let stock: i64 = row.try_get("stock")?;
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            currency: row.try_get("currency")?,
            category: row.try_get("category")?,
            stock: u32::try_from(stock)
                .map_err(|_| StoreError::CorruptRow(format!("negative stock: {stock}")))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn parse_status(status: &str) -> Result<OrderStatus> {
        match status {
            "Blocked" => Ok(OrderStatus::Blocked),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(StoreError::CorruptRow(format!("unknown order status: {other}"))),
        }
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            status: Self::parse_status(row.try_get::<String, _>("status")?.as_str())?,
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
            items,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(OrderItem {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::CorruptRow(format!("bad quantity: {quantity}")))?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
        })
    }

    async fn load_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT product_id, product_name, quantity, unit_price_cents, total_price_cents
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id.as_i64())
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn fetch_order(&self, order_id: OrderId, blocked_only: bool) -> Result<Option<Order>> {
        let query = if blocked_only {
            "SELECT id, product_id, amount_cents, status, created_at, completed_at
             FROM orders WHERE id = $1 AND status = 'Blocked'"
        } else {
            "SELECT id, product_id, amount_cents, status, created_at, completed_at
             FROM orders WHERE id = $1"
        };

        let Some(row) = sqlx::query(query)
            .bind(order_id.as_i64())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            "SELECT product_id, product_name, quantity, unit_price_cents, total_price_cents
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .into_iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self::row_to_order(&row, items)?))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn seed_products(&self, products: Vec<Product>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for product in products {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, description, price_cents, currency, category, stock, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    price_cents = EXCLUDED.price_cents,
                    currency = EXCLUDED.currency,
                    category = EXCLUDED.category,
                    stock = EXCLUDED.stock
                "#,
            )
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.cents())
            .bind(&product.currency)
            .bind(&product.category)
            .bind(product.stock as i64)
            .bind(product.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price_cents, currency, category, stock, created_at
             FROM products WHERE id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.fetch_order(order_id, false).await
    }

    async fn get_blocked_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.fetch_order(order_id, true).await
    }

    async fn reserve_and_create(
        &self,
        order: NewOrder,
        reservations: &HashMap<ProductId, u32>,
    ) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        // Lock and check every product before decrementing anything.
        for (product_id, quantity) in reservations {
            let row = sqlx::query("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;

            let Some(row) = row else {
                tx.rollback().await?;
                return Ok(None);
            };
            let stock: i64 = row.try_get("stock")?;
            if stock < *quantity as i64 {
                tracing::debug!(%product_id, stock, requested = *quantity, "reservation rejected");
                tx.rollback().await?;
                return Ok(None);
            }
        }

        for (product_id, quantity) in reservations {
            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(*quantity as i64)
                .bind(product_id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (product_id, amount_cents, status, created_at)
             VALUES ($1, $2, 'Blocked', $3) RETURNING id",
        )
        .bind(order.product_id.as_str())
        .bind(order.amount.cents())
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price_cents, total_price_cents)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(item.quantity as i64)
            .bind(item.unit_price.cents())
            .bind(item.total_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(order.into_order(OrderId::new(order_id))))
    }

    async fn complete(&self, order_id: OrderId) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, product_id, amount_cents, status, created_at, completed_at
             FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let status = Self::parse_status(row.try_get::<String, _>("status")?.as_str())?;
        if !status.can_complete() {
            tracing::debug!(%order_id, %status, "completion rejected, order not blocked");
            tx.rollback().await?;
            return Ok(None);
        }

        let completed_at: DateTime<Utc> = Utc::now();
        sqlx::query("UPDATE orders SET status = 'Completed', completed_at = $1 WHERE id = $2")
            .bind(completed_at)
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        let items = Self::load_items(&mut tx, order_id).await?;
        let mut order = Self::row_to_order(&row, items)?;
        order.status = OrderStatus::Completed;
        order.completed_at = Some(completed_at);

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn cancel_and_restore(&self, order_id: OrderId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id.as_i64())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(false);
        };
        let status = Self::parse_status(row.try_get::<String, _>("status")?.as_str())?;
        if !status.can_cancel() {
            tx.rollback().await?;
            return Ok(false);
        }

        let items = Self::load_items(&mut tx, order_id).await?;
        for item in &items {
            sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                .bind(item.quantity as i64)
                .bind(item.product_id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE orders SET status = 'Cancelled', completed_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
