//! HTTP handlers for the packaging type catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::MessageResponse;
use crate::middleware::CurrentUser;
use crate::services::deposit_type::{DepositType, DepositTypeService};
use crate::AppState;
use shared::models::{CreateDepositTypeInput, UpdateDepositTypeInput};

/// Query parameters for listing packaging types
#[derive(Debug, Default, Deserialize)]
pub struct ListDepositTypesQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// Create a packaging type
pub async fn create_deposit_type(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateDepositTypeInput>,
) -> AppResult<Json<DepositType>> {
    let service = DepositTypeService::new(state.db);
    let deposit_type = service.create(input).await?;
    Ok(Json(deposit_type))
}

/// List packaging types
pub async fn list_deposit_types(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListDepositTypesQuery>,
) -> AppResult<Json<Vec<DepositType>>> {
    let service = DepositTypeService::new(state.db);
    let deposit_types = service.list(query.active_only).await?;
    Ok(Json(deposit_types))
}

/// Get a packaging type
pub async fn get_deposit_type(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(type_id): Path<Uuid>,
) -> AppResult<Json<DepositType>> {
    let service = DepositTypeService::new(state.db);
    let deposit_type = service.get(type_id).await?;
    Ok(Json(deposit_type))
}

/// Update a packaging type
pub async fn update_deposit_type(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(type_id): Path<Uuid>,
    Json(input): Json<UpdateDepositTypeInput>,
) -> AppResult<Json<DepositType>> {
    let service = DepositTypeService::new(state.db);
    let deposit_type = service.update(type_id, input).await?;
    Ok(Json(deposit_type))
}

/// Delete a packaging type that no deposit references
pub async fn delete_deposit_type(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(type_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let service = DepositTypeService::new(state.db);
    service.delete(type_id).await?;
    Ok(Json(MessageResponse::new("Packaging type deleted")))
}
