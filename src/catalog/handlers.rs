use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateProductRequest, UpdateProductRequest};
use super::repo::{self, Product};
use super::services::{self, ProductTypeSummary};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/mine", get(list_my_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub fn product_type_routes() -> Router<AppState> {
    Router::new().route("/product-types", get(list_product_types))
}

/// Grouped catalog view: every product type with its product count and
/// a three-product preview.
#[instrument(skip(state))]
pub async fn list_product_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductTypeSummary>>, AppError> {
    let summary = services::get_product_type_summary(&state.db).await?;
    Ok(Json(summary))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = repo::list_products(&state.db).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn list_my_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = repo::list_products_by_owner(&state.db, user_id).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = repo::find_product(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    repo::find_type(&state.db, payload.product_type_id)
        .await?
        .ok_or(AppError::NotFound("product type"))?;

    let product = repo::insert_product(&state.db, user_id, &payload).await?;
    info!(product_id = %product.id, %user_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let product = repo::update_product(&state.db, id, user_id, &payload)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    info!(product_id = %product.id, %user_id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = repo::delete_product(&state.db, id, user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("product"));
    }
    info!(product_id = %id, %user_id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
