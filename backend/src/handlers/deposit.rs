//! HTTP handlers for the deposit (consignment) ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::MessageResponse;
use crate::middleware::CurrentUser;
use crate::services::deposit::{Deposit, DepositFilter, DepositService, DepositStats};
use crate::services::deposit_return::{DepositReturn, DepositReturnService, ReturnOutcome};
use crate::AppState;
use shared::models::{IssueIncomingInput, IssueOutgoingInput, ProcessReturnInput};

/// Request body for writing a deposit off
#[derive(Debug, Default, Deserialize)]
pub struct WriteOffInput {
    pub notes: Option<String>,
}

/// Issue packaging to a customer
pub async fn issue_outgoing_deposit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<IssueOutgoingInput>,
) -> AppResult<Json<Deposit>> {
    let service = DepositService::new(state.db);
    let deposit = service.issue_outgoing(current_user.0.user_id, input).await?;
    Ok(Json(deposit))
}

/// Record packaging received from a supplier
pub async fn issue_incoming_deposit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<IssueIncomingInput>,
) -> AppResult<Json<Deposit>> {
    let service = DepositService::new(state.db);
    let deposit = service.issue_incoming(current_user.0.user_id, input).await?;
    Ok(Json(deposit))
}

/// List deposits matching the filter
pub async fn list_deposits(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<DepositFilter>,
) -> AppResult<Json<Vec<Deposit>>> {
    let service = DepositService::new(state.db);
    let deposits = service.list(filter).await?;
    Ok(Json(deposits))
}

/// List deposits still waiting on returns
pub async fn list_pending_deposits(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Deposit>>> {
    let service = DepositService::new(state.db);
    let deposits = service.list_pending().await?;
    Ok(Json(deposits))
}

/// Get a deposit
pub async fn get_deposit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(deposit_id): Path<Uuid>,
) -> AppResult<Json<Deposit>> {
    let service = DepositService::new(state.db);
    let deposit = service.get(deposit_id).await?;
    Ok(Json(deposit))
}

/// Process a return against a deposit
pub async fn process_deposit_return(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(deposit_id): Path<Uuid>,
    Json(input): Json<ProcessReturnInput>,
) -> AppResult<Json<ReturnOutcome>> {
    let service = DepositReturnService::new(state.db);
    let outcome = service
        .process_return(deposit_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(outcome))
}

/// List returns recorded against a deposit
pub async fn list_deposit_returns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(deposit_id): Path<Uuid>,
) -> AppResult<Json<Vec<DepositReturn>>> {
    let service = DepositReturnService::new(state.db);
    let returns = service.list_for_deposit(deposit_id).await?;
    Ok(Json(returns))
}

/// Write a deposit off
pub async fn write_off_deposit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(deposit_id): Path<Uuid>,
    input: Option<Json<WriteOffInput>>,
) -> AppResult<Json<Deposit>> {
    let notes = input.and_then(|Json(body)| body.notes);
    let service = DepositService::new(state.db);
    let deposit = service.write_off(deposit_id, notes).await?;
    Ok(Json(deposit))
}

/// Delete a deposit with no recorded returns
pub async fn delete_deposit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(deposit_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let service = DepositService::new(state.db);
    service.delete(deposit_id).await?;
    Ok(Json(MessageResponse::new("Deposit deleted")))
}

/// Deposit ledger dashboard summary
pub async fn get_deposit_stats(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> Json<DepositStats> {
    let service = DepositService::new(state.db);
    Json(service.stats().await)
}
