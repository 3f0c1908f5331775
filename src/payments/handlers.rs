use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreatePaymentTypeRequest, UpdatePaymentTypeRequest};
use super::repo::{self, PaymentType};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn payment_type_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payment-types",
            get(list_payment_types).post(create_payment_type),
        )
        .route(
            "/payment-types/:id",
            get(get_payment_type)
                .put(update_payment_type)
                .delete(delete_payment_type),
        )
}

#[instrument(skip(state))]
pub async fn list_payment_types(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PaymentType>>, AppError> {
    let rows = repo::list_by_owner(&state.db, user_id).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_payment_type(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentType>, AppError> {
    let row = repo::find_payment_type(&state.db, id, user_id)
        .await?
        .ok_or(AppError::NotFound("payment type"))?;
    Ok(Json(row))
}

#[instrument(skip(state, payload))]
pub async fn create_payment_type(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePaymentTypeRequest>,
) -> Result<(StatusCode, Json<PaymentType>), AppError> {
    let row = repo::insert_payment_type(&state.db, user_id, &payload).await?;
    info!(payment_type_id = %row.id, %user_id, "payment type created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_payment_type(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentTypeRequest>,
) -> Result<Json<PaymentType>, AppError> {
    let row = repo::update_payment_type(&state.db, id, user_id, &payload)
        .await?
        .ok_or(AppError::NotFound("payment type"))?;
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn delete_payment_type(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = repo::delete_payment_type(&state.db, id, user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("payment type"));
    }
    info!(payment_type_id = %id, %user_id, "payment type deleted");
    Ok(StatusCode::NO_CONTENT)
}
