use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateProductRequest, UpdateProductRequest};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub user_id: Uuid,
    pub product_type_id: Uuid,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductType {
    pub id: Uuid,
    pub label: String,
}

pub async fn list_types(db: &PgPool) -> Result<Vec<ProductType>, AppError> {
    let rows = sqlx::query_as::<_, ProductType>(
        r#"
        SELECT id, label
        FROM product_types
        ORDER BY label ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_type(db: &PgPool, type_id: Uuid) -> Result<Option<ProductType>, AppError> {
    let row = sqlx::query_as::<_, ProductType>(
        r#"
        SELECT id, label
        FROM product_types
        WHERE id = $1
        "#,
    )
    .bind(type_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// All products, ascending id so type-summary previews are stable.
pub async fn list_products(db: &PgPool) -> Result<Vec<Product>, AppError> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, title, description, price, quantity, user_id, product_type_id,
               city, image_url, created_at
        FROM products
        ORDER BY id ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_products_by_owner(db: &PgPool, user_id: Uuid) -> Result<Vec<Product>, AppError> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, title, description, price, quantity, user_id, product_type_id,
               city, image_url, created_at
        FROM products
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_product(db: &PgPool, product_id: Uuid) -> Result<Option<Product>, AppError> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, title, description, price, quantity, user_id, product_type_id,
               city, image_url, created_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert_product(
    db: &PgPool,
    user_id: Uuid,
    req: &CreateProductRequest,
) -> Result<Product, AppError> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (user_id, title, description, price, quantity, product_type_id, city, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, title, description, price, quantity, user_id, product_type_id,
                  city, image_url, created_at
        "#,
    )
    .bind(user_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.quantity)
    .bind(req.product_type_id)
    .bind(&req.city)
    .bind(&req.image_url)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::from_write("product type", e))?;
    Ok(row)
}

/// Owner-scoped update. The product type and owner are fixed at creation.
pub async fn update_product(
    db: &PgPool,
    product_id: Uuid,
    user_id: Uuid,
    req: &UpdateProductRequest,
) -> Result<Option<Product>, AppError> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET title = $3, description = $4, price = $5, quantity = $6, city = $7, image_url = $8
        WHERE id = $1 AND user_id = $2
        RETURNING id, title, description, price, quantity, user_id, product_type_id,
                  city, image_url, created_at
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.quantity)
    .bind(&req.city)
    .bind(&req.image_url)
    .fetch_optional(db)
    .await
    .map_err(|e| AppError::from_write("product type", e))?;
    Ok(row)
}

/// Owner-scoped delete. Fails with `ReferentialConflict` while any
/// order line item still references the product.
pub async fn delete_product(
    db: &PgPool,
    product_id: Uuid,
    user_id: Uuid,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM products
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .execute(db)
    .await
    .map_err(|e| AppError::from_delete("product", e))?;
    Ok(result.rows_affected() > 0)
}
