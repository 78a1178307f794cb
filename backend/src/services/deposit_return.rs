//! Deposit return processing service
//!
//! Applies a return event against a deposit: splits the returned quantity
//! into good/damaged/lost, computes the refund and penalties, moves the
//! deposit's counters and status, and puts good units back into (or out of)
//! packaging stock. Everything happens in one transaction against locked
//! rows; a failure at any step rolls the whole event back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::deposit::{lock_deposit, lock_deposit_type, Deposit};
use shared::models::{LedgerRule, ProcessReturnInput, ReturnComputation};
use shared::types::{reference_for, RETURN_REFERENCE_PREFIX};
use shared::validation::validate_penalty;

/// Service processing returns against deposits
#[derive(Clone)]
pub struct DepositReturnService {
    db: PgPool,
}

/// One return event against a deposit. Immutable once created, apart from
/// the soft-delete tombstone.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepositReturn {
    pub id: Uuid,
    pub reference: String,
    pub deposit_id: Uuid,
    pub quantity_returned: i32,
    pub good_condition: i32,
    pub damaged: i32,
    pub lost: i32,
    pub refund_amount: Decimal,
    pub damage_penalty: Decimal,
    pub delay_penalty: Decimal,
    pub total_penalty: Decimal,
    pub net_refund: Decimal,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Result of processing a return: the event plus the updated deposit
#[derive(Debug, Serialize)]
pub struct ReturnOutcome {
    pub deposit_return: DepositReturn,
    pub deposit: Deposit,
}

const RETURN_COLUMNS: &str = "id, reference, deposit_id, quantity_returned, good_condition, damaged, \
                              lost, refund_amount, damage_penalty, delay_penalty, total_penalty, \
                              net_refund, notes, recorded_by, created_at, deleted_at";

impl DepositReturnService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Process a return against a deposit
    pub async fn process_return(
        &self,
        deposit_id: Uuid,
        recorded_by: Uuid,
        input: ProcessReturnInput,
    ) -> AppResult<ReturnOutcome> {
        input.validate()?;

        let damage_penalty = input.damage_penalty.unwrap_or(Decimal::ZERO);
        let delay_penalty = input.delay_penalty.unwrap_or(Decimal::ZERO);
        for (field, penalty) in [
            ("damage_penalty", damage_penalty),
            ("delay_penalty", delay_penalty),
        ] {
            if let Err(msg) = validate_penalty(penalty) {
                return Err(AppError::Validation {
                    field: field.to_string(),
                    message: msg.to_string(),
                    message_fr: "La pénalité ne peut pas être négative".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        let deposit = lock_deposit(&mut tx, deposit_id).await?;

        let status = deposit.status()?;
        if !status.accepts_returns() {
            return Err(LedgerRule::DepositClosed.into());
        }

        input.split().check(input.quantity)?;
        let progress = deposit.progress().apply_return(input.quantity)?;

        let computation = ReturnComputation::compute(
            input.good_condition,
            deposit.unit_deposit_amount,
            damage_penalty,
            delay_penalty,
        );

        let reference = reference_for(RETURN_REFERENCE_PREFIX, Utc::now().date_naive());

        let deposit_return = sqlx::query_as::<_, DepositReturn>(&format!(
            r#"
            INSERT INTO deposit_returns (
                reference, deposit_id, quantity_returned, good_condition, damaged, lost,
                refund_amount, damage_penalty, delay_penalty, total_penalty, net_refund,
                notes, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {RETURN_COLUMNS}
            "#,
        ))
        .bind(&reference)
        .bind(deposit_id)
        .bind(input.quantity)
        .bind(input.good_condition)
        .bind(input.damaged)
        .bind(input.lost)
        .bind(computation.refund_amount)
        .bind(computation.damage_penalty)
        .bind(computation.delay_penalty)
        .bind(computation.total_penalty)
        .bind(computation.net_refund)
        .bind(&input.notes)
        .bind(recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        let new_status = progress.status();
        let updated_deposit = sqlx::query_as::<_, Deposit>(
            r#"
            UPDATE deposits
            SET quantity_returned = $1, quantity_pending = $2, status = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, reference, direction, customer_id, supplier_id, deposit_type_id,
                      quantity, unit_deposit_amount, total_deposit_amount, quantity_returned,
                      quantity_pending, status, notes, recorded_by, created_at, updated_at
            "#,
        )
        .bind(progress.quantity_returned)
        .bind(progress.quantity_pending)
        .bind(new_status.as_str())
        .bind(deposit_id)
        .fetch_one(&mut *tx)
        .await?;

        // Good units move packaging stock: back into the shop for outgoing
        // deposits, back to the supplier for incoming ones
        if input.good_condition > 0 {
            let direction = deposit.direction()?;
            let deposit_type = lock_deposit_type(&mut tx, deposit.deposit_type_id).await?;
            let new_stock =
                deposit_type.current_stock + direction.stock_delta_on_return(input.good_condition);
            if new_stock < 0 {
                return Err(LedgerRule::InsufficientStock.into());
            }

            sqlx::query(
                "UPDATE deposit_types SET current_stock = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(new_stock)
            .bind(deposit.deposit_type_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            reference = %deposit_return.reference,
            deposit = %updated_deposit.reference,
            quantity = input.quantity,
            net_refund = %deposit_return.net_refund,
            "deposit return processed"
        );

        Ok(ReturnOutcome {
            deposit_return,
            deposit: updated_deposit,
        })
    }

    /// List non-deleted returns recorded against a deposit
    pub async fn list_for_deposit(&self, deposit_id: Uuid) -> AppResult<Vec<DepositReturn>> {
        let deposit_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM deposits WHERE id = $1)")
                .bind(deposit_id)
                .fetch_one(&self.db)
                .await?;

        if !deposit_exists {
            return Err(AppError::NotFound("Deposit".to_string()));
        }

        let returns = sqlx::query_as::<_, DepositReturn>(&format!(
            r#"
            SELECT {RETURN_COLUMNS}
            FROM deposit_returns
            WHERE deposit_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        ))
        .bind(deposit_id)
        .fetch_all(&self.db)
        .await?;

        Ok(returns)
    }
}
