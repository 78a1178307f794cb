//! HTTP handlers for the credit-payment ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::credit::{
    CreditPayment, CreditSaleSummary, CreditService, CustomerCreditSummary, PaymentOutcome,
    SaleBalance,
};
use crate::AppState;
use shared::models::{CreditStatus, RecordPaymentInput, VoidWindow};

fn credit_service(state: &AppState) -> CreditService {
    CreditService::new(
        state.db.clone(),
        VoidWindow::hours(state.config.ledger.void_window_hours),
    )
}

/// Query parameters for listing credit sales
#[derive(Debug, Default, Deserialize)]
pub struct CreditSalesQuery {
    pub status: Option<CreditStatus>,
}

/// Record a payment against a credit sale
pub async fn record_credit_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordPaymentInput>,
) -> AppResult<Json<PaymentOutcome>> {
    let service = credit_service(&state);
    let outcome = service
        .record_payment(current_user.0.user_id, input)
        .await?;
    Ok(Json(outcome))
}

/// Void a recent payment
pub async fn void_credit_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<SaleBalance>> {
    let service = credit_service(&state);
    let balance = service
        .void_payment(payment_id, current_user.0.user_id)
        .await?;
    Ok(Json(balance))
}

/// List non-voided payments for a sale
pub async fn list_sale_payments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Vec<CreditPayment>>> {
    let service = credit_service(&state);
    let payments = service.list_payments(sale_id).await?;
    Ok(Json(payments))
}

/// List credit sales with their derived status
pub async fn list_credit_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<CreditSalesQuery>,
) -> AppResult<Json<Vec<CreditSaleSummary>>> {
    let service = credit_service(&state);
    let sales = service.list_credit_sales(query.status).await?;
    Ok(Json(sales))
}

/// Outstanding credit position of a customer
pub async fn get_customer_credit_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerCreditSummary>> {
    let service = credit_service(&state);
    let summary = service.customer_summary(customer_id).await?;
    Ok(Json(summary))
}
