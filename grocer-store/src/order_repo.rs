use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grocer_cart::{CartLine, PaymentMethod};
use grocer_order::{Order, OrderError, OrderRepository, OrderStatus};
use grocer_shared::Masked;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, reference, customer_name, customer_email, customer_phone, lines, \
    subtotal, delivery_fee, grand_total, points_earned, payment_method, status, created_at, updated_at";

/// Order history backed by the `orders` table
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running order migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    reference: String,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    lines: Json<Vec<CartLine>>,
    subtotal: Decimal,
    delivery_fee: Decimal,
    grand_total: Decimal,
    points_earned: i64,
    payment_method: String,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, OrderError> {
        let payment_method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(OrderError::Storage)?;
        let points_earned = u64::try_from(self.points_earned)
            .map_err(|_| OrderError::Storage(format!("negative points on order {}", self.id)))?;

        Ok(Order {
            id: self.id,
            reference: self.reference,
            customer_name: self.customer_name,
            customer_email: self.customer_email.map(Masked::new),
            customer_phone: self.customer_phone.map(Masked::new),
            lines: self.lines.0,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            grand_total: self.grand_total,
            points_earned,
            payment_method,
            // rows edited by hand in the dashboard may carry anything here
            status: OrderStatus::parse_lenient(self.status.as_deref()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn storage(err: sqlx::Error) -> OrderError {
    OrderError::Storage(err.to_string())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn append(&self, order: &Order) -> Result<(), OrderError> {
        let points = i64::try_from(order.points_earned)
            .map_err(|_| OrderError::Storage(format!("points overflow on order {}", order.id)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (id, reference, customer_name, customer_email, customer_phone, lines,
                subtotal, delivery_fee, grand_total, points_earned, payment_method, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(order.id)
        .bind(&order.reference)
        .bind(&order.customer_name)
        .bind(order.customer_email.as_ref().map(|e| e.expose().as_str()))
        .bind(order.customer_phone.as_ref().map(|p| p.expose().as_str()))
        .bind(Json(&order.lines))
        .bind(order.subtotal)
        .bind(order.delivery_fee)
        .bind(order.grand_total)
        .bind(points)
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(OrderError::Duplicate(order.id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, OrderError> {
        let query = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn list_for_customer(&self, email: &str) -> Result<Vec<Order>, OrderError> {
        let query = format!(
            "SELECT {} FROM orders WHERE LOWER(customer_email) = LOWER($1) ORDER BY created_at",
            ORDER_COLUMNS
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&query)
            .bind(email.trim())
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let query = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
        let row: OrderRow = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?
            .ok_or(OrderError::NotFound(id))?;

        let mut order = row.into_order()?;
        let event = order.advance_to(status)?;

        sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(order.status.as_str())
            .bind(order.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        info!(order_id = %event.order_id, from = %event.from, to = %event.to, "Order status advanced");
        Ok(order)
    }
}
