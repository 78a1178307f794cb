//! Error handling for the SmartDrinkStore backend
//!
//! Provides consistent error responses in English and French

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{CreditRule, LedgerRule};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Deposit ledger business rules
    #[error("Return quantity exceeds pending quantity ({pending} pending)")]
    ExceedsPendingQuantity { pending: i32 },

    #[error("Condition split does not sum to the returned quantity")]
    ReturnSplitMismatch,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient packaging stock: {0}")]
    InsufficientStock(String),

    #[error("Deposit has recorded returns and cannot be deleted")]
    DepositHasReturns,

    #[error("Packaging type is referenced by deposits and cannot be deleted")]
    DepositTypeInUse,

    #[error("Packaging type is inactive: {0}")]
    DepositTypeInactive(String),

    // Credit ledger business rules
    #[error("Sale is not a credit sale")]
    NotACreditSale,

    #[error("Payment exceeds the remaining balance ({remaining})")]
    ExceedsRemainingBalance { remaining: Decimal },

    #[error("Payment is too old to void")]
    VoidWindowExpired,

    #[error("Payment is already voided")]
    AlreadyVoided,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Authoritative value the caller can re-render without a second round
    /// trip: remaining credit balance or pending quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<Decimal>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: String, message_fr: String) -> Self {
        Self {
            code: code.to_string(),
            message_en,
            message_fr,
            field: None,
            remaining: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_fr,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_fr.clone())
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new(
                        "DUPLICATE_ENTRY",
                        format!("A record with this {} already exists", field),
                        format!("Un enregistrement avec ce {} existe déjà", field),
                    )
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("{} introuvable", resource),
                ),
            ),
            AppError::ExceedsPendingQuantity { pending } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    remaining: Some(Decimal::from(*pending)),
                    ..ErrorDetail::new(
                        "EXCEEDS_PENDING_QUANTITY",
                        format!(
                            "Return quantity exceeds pending quantity ({} pending)",
                            pending
                        ),
                        format!(
                            "La quantité retournée dépasse la quantité en attente ({} en attente)",
                            pending
                        ),
                    )
                },
            ),
            AppError::ReturnSplitMismatch => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "RETURN_SPLIT_MISMATCH",
                    "Good, damaged and lost counts must sum to the returned quantity".to_string(),
                    "Les quantités en bon état, endommagées et perdues doivent correspondre à la quantité retournée"
                        .to_string(),
                ),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "INVALID_STATE_TRANSITION",
                    msg.clone(),
                    format!("Changement d'état impossible : {}", msg),
                ),
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    msg.clone(),
                    format!("Stock d'emballages insuffisant : {}", msg),
                ),
            ),
            AppError::DepositHasReturns => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "DEPOSIT_HAS_RETURNS",
                    "Deposit has recorded returns and cannot be deleted".to_string(),
                    "La consigne a des retours enregistrés et ne peut pas être supprimée"
                        .to_string(),
                ),
            ),
            AppError::DepositTypeInUse => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "DEPOSIT_TYPE_IN_USE",
                    "Packaging type is referenced by deposits and cannot be deleted".to_string(),
                    "Le type d'emballage est utilisé par des consignes et ne peut pas être supprimé"
                        .to_string(),
                ),
            ),
            AppError::DepositTypeInactive(code) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "DEPOSIT_TYPE_INACTIVE",
                    format!("Packaging type {} is inactive", code),
                    format!("Le type d'emballage {} est inactif", code),
                ),
            ),
            AppError::NotACreditSale => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "NOT_A_CREDIT_SALE",
                    "Sale is not a credit sale".to_string(),
                    "La vente n'est pas une vente à crédit".to_string(),
                ),
            ),
            AppError::ExceedsRemainingBalance { remaining } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    remaining: Some(*remaining),
                    ..ErrorDetail::new(
                        "EXCEEDS_REMAINING_BALANCE",
                        format!("Payment exceeds the remaining balance ({})", remaining),
                        format!("Le paiement dépasse le solde restant ({})", remaining),
                    )
                },
            ),
            AppError::VoidWindowExpired => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "VOID_WINDOW_EXPIRED",
                    "Payment is too old to void".to_string(),
                    "Le paiement est trop ancien pour être annulé".to_string(),
                ),
            ),
            AppError::AlreadyVoided => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "ALREADY_VOIDED",
                    "Payment is already voided".to_string(),
                    "Le paiement est déjà annulé".to_string(),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    "Une erreur de base de données est survenue".to_string(),
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    msg.clone(),
                    "Erreur interne du serveur".to_string(),
                ),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    "Erreur interne du serveur".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<LedgerRule> for AppError {
    fn from(rule: LedgerRule) -> Self {
        match rule {
            LedgerRule::ExceedsPending { pending } => AppError::ExceedsPendingQuantity { pending },
            LedgerRule::SplitMismatch => AppError::ReturnSplitMismatch,
            LedgerRule::DepositClosed => {
                AppError::InvalidStateTransition("deposit no longer accepts returns".to_string())
            }
            LedgerRule::InsufficientStock => AppError::InsufficientStock(
                "stock adjustment would drive packaging stock below zero".to_string(),
            ),
        }
    }
}

impl From<CreditRule> for AppError {
    fn from(rule: CreditRule) -> Self {
        match rule {
            CreditRule::NotACreditSale => AppError::NotACreditSale,
            CreditRule::ExceedsRemaining { remaining } => {
                AppError::ExceedsRemainingBalance { remaining }
            }
            CreditRule::VoidWindowExpired => AppError::VoidWindowExpired,
            CreditRule::AlreadyVoided => AppError::AlreadyVoided,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, detail) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let detail = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), detail)
            })
            .unwrap_or_else(|| ("input".to_string(), "invalid value".to_string()));

        AppError::Validation {
            message: format!("Invalid value for {}: {}", field, detail),
            message_fr: format!("Valeur invalide pour {}", field),
            field,
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
