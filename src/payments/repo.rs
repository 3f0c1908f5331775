use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreatePaymentTypeRequest, UpdatePaymentTypeRequest};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentType {
    pub id: Uuid,
    pub description: String,
    pub account_number: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

pub async fn list_by_owner(db: &PgPool, user_id: Uuid) -> Result<Vec<PaymentType>, AppError> {
    let rows = sqlx::query_as::<_, PaymentType>(
        r#"
        SELECT id, description, account_number, user_id, created_at
        FROM payment_types
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_payment_type(
    db: &PgPool,
    payment_type_id: Uuid,
    user_id: Uuid,
) -> Result<Option<PaymentType>, AppError> {
    let row = sqlx::query_as::<_, PaymentType>(
        r#"
        SELECT id, description, account_number, user_id, created_at
        FROM payment_types
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(payment_type_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert_payment_type(
    db: &PgPool,
    user_id: Uuid,
    req: &CreatePaymentTypeRequest,
) -> Result<PaymentType, AppError> {
    let row = sqlx::query_as::<_, PaymentType>(
        r#"
        INSERT INTO payment_types (user_id, description, account_number)
        VALUES ($1, $2, $3)
        RETURNING id, description, account_number, user_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(&req.description)
    .bind(&req.account_number)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_payment_type(
    db: &PgPool,
    payment_type_id: Uuid,
    user_id: Uuid,
    req: &UpdatePaymentTypeRequest,
) -> Result<Option<PaymentType>, AppError> {
    let row = sqlx::query_as::<_, PaymentType>(
        r#"
        UPDATE payment_types
        SET description = $3, account_number = $4
        WHERE id = $1 AND user_id = $2
        RETURNING id, description, account_number, user_id, created_at
        "#,
    )
    .bind(payment_type_id)
    .bind(user_id)
    .bind(&req.description)
    .bind(&req.account_number)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Owner-scoped delete. Fails with `ReferentialConflict` while any
/// placed order still references the payment type.
pub async fn delete_payment_type(
    db: &PgPool,
    payment_type_id: Uuid,
    user_id: Uuid,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM payment_types
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(payment_type_id)
    .bind(user_id)
    .execute(db)
    .await
    .map_err(|e| AppError::from_delete("payment type", e))?;
    Ok(result.rows_affected() > 0)
}
