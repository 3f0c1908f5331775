use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::repo::Product;
use crate::error::AppError;

/// An order with neither a payment type nor a completion timestamp is
/// the user's open cart.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub completed_at: Option<OffsetDateTime>,
    pub payment_type_id: Option<Uuid>,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.payment_type_id.is_none() && self.completed_at.is_none()
    }
}

/// Join row: one unit of a product added to an order. Quantity is
/// modeled as the number of rows per (order, product) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderProduct {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// One association row joined with its referenced product.
#[derive(Debug, Clone, FromRow)]
pub struct CartRow {
    pub order_product_id: Uuid,
    pub order_id: Uuid,
    #[sqlx(flatten)]
    pub product: Product,
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Order>, AppError> {
    let rows = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, created_at, completed_at, payment_type_id
        FROM orders
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(
    db: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Order>, AppError> {
    let row = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, created_at, completed_at, payment_type_id
        FROM orders
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Every open order for the user. The schema's partial unique index
/// allows at most one; callers treat more than one as corruption.
pub async fn open_orders_for_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Order>, AppError> {
    let rows = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, created_at, completed_at, payment_type_id
        FROM orders
        WHERE user_id = $1 AND payment_type_id IS NULL AND completed_at IS NULL
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_order(db: &PgPool, user_id: Uuid) -> Result<Order, AppError> {
    let row = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (user_id)
        VALUES ($1)
        RETURNING id, user_id, created_at, completed_at, payment_type_id
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::from_open_order_write("order", e))?;
    Ok(row)
}

/// Owner-scoped update of the placement fields. Clearing the payment
/// type reopens the order, which the one-open-order index rejects if
/// the user already has a live cart.
pub async fn update_order(
    db: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
    payment_type_id: Option<Uuid>,
    completed_at: Option<OffsetDateTime>,
) -> Result<Option<Order>, AppError> {
    let row = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET payment_type_id = $3, completed_at = $4
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, created_at, completed_at, payment_type_id
        "#,
    )
    .bind(order_id)
    .bind(user_id)
    .bind(payment_type_id)
    .bind(completed_at)
    .fetch_optional(db)
    .await
    .map_err(|e| AppError::from_open_order_write("payment type", e))?;
    Ok(row)
}

/// Owner-scoped delete. Fails with `ReferentialConflict` while line
/// items still reference the order.
pub async fn delete_order(db: &PgPool, order_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM orders
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(order_id)
    .bind(user_id)
    .execute(db)
    .await
    .map_err(|e| AppError::from_delete("order", e))?;
    Ok(result.rows_affected() > 0)
}

/// Append one unit of a product to an order.
pub async fn insert_item(
    db: &PgPool,
    order_id: Uuid,
    product_id: Uuid,
) -> Result<OrderProduct, AppError> {
    let row = sqlx::query_as::<_, OrderProduct>(
        r#"
        INSERT INTO order_products (order_id, product_id)
        VALUES ($1, $2)
        RETURNING id, order_id, product_id, created_at
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::from_write("product", e))?;
    Ok(row)
}

/// Remove one unit (the most recently added row) of a product from an
/// order. Returns false when the order holds no such product.
pub async fn delete_one_item(
    db: &PgPool,
    order_id: Uuid,
    product_id: Uuid,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM order_products
        WHERE id = (
            SELECT id
            FROM order_products
            WHERE order_id = $1 AND product_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        )
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Open a REPEATABLE READ transaction so multi-statement cart reads
/// see one consistent snapshot of the order's rows.
pub async fn begin_cart_read(db: &PgPool) -> Result<Transaction<'_, Postgres>, AppError> {
    let mut tx = db.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// All association rows of an order joined with their products, in
/// insertion order so aggregation is deterministic.
pub async fn list_cart_rows<'e>(
    db: impl PgExecutor<'e>,
    order_id: Uuid,
) -> Result<Vec<CartRow>, AppError> {
    let rows = sqlx::query_as::<_, CartRow>(
        r#"
        SELECT op.id AS order_product_id, op.order_id,
               p.id, p.title, p.description, p.price, p.quantity, p.user_id,
               p.product_type_id, p.city, p.image_url, p.created_at
        FROM order_products op
        JOIN products p ON p.id = op.product_id
        WHERE op.order_id = $1
        ORDER BY op.created_at ASC, op.id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_items<'e>(db: impl PgExecutor<'e>, order_id: Uuid) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM order_products
        WHERE order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}
