use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{AddCartItemRequest, OrderDetails, UpdateOrderRequest};
use super::repo::{self, Order, OrderProduct};
use super::services::{self, Cart};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_cart_item))
        .route("/cart/items/:product_id", delete(remove_cart_item))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
}

/// The acting user's cart: their open order with aggregated line
/// items, or a distinguished empty result.
#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Cart>, AppError> {
    let cart = services::get_cart(&state.db, user_id).await?;
    Ok(Json(cart))
}

#[instrument(skip(state, payload))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<OrderProduct>), AppError> {
    let item = services::add_item(&state.db, user_id, payload.product_id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::remove_item(&state.db, user_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetails>, AppError> {
    let details = services::get_order_details(&state.db, id, user_id).await?;
    Ok(Json(details))
}

/// Explicit cart creation. Returns the existing open order when the
/// user already has one.
#[instrument(skip(state))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = services::find_or_create_open_order(&state.db, user_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state, payload))]
pub async fn update_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = services::update_order(&state.db, id, user_id, payload.payment_type_id).await?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = repo::delete_order(&state.db, id, user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("order"));
    }
    Ok(StatusCode::NO_CONTENT)
}
