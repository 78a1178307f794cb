//! Deposit (consignment) ledger service
//!
//! Issues outgoing deposits to customers and incoming deposits from
//! suppliers, and keeps the packaging-type stock in step with every
//! movement. All mutations run in a single transaction with the affected
//! rows locked, so concurrent operations against the same deposit or
//! packaging type serialize instead of racing the invariant checks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::{
    DepositDirection, DepositProgress, DepositStatus, IssueIncomingInput, IssueOutgoingInput,
};
use shared::types::reference_for;
use shared::validation::validate_deposit_amount;

/// Deposit ledger service
#[derive(Clone)]
pub struct DepositService {
    db: PgPool,
}

/// One consignment transaction
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Deposit {
    pub id: Uuid,
    pub reference: String,
    pub direction: String,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub deposit_type_id: Uuid,
    pub quantity: i32,
    pub unit_deposit_amount: Decimal,
    pub total_deposit_amount: Decimal,
    pub quantity_returned: i32,
    pub quantity_pending: i32,
    pub status: String,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deposit {
    pub fn direction(&self) -> AppResult<DepositDirection> {
        DepositDirection::from_str(&self.direction)
            .ok_or_else(|| AppError::Internal(format!("unknown deposit direction {}", self.direction)))
    }

    pub fn status(&self) -> AppResult<DepositStatus> {
        DepositStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown deposit status {}", self.status)))
    }

    pub fn progress(&self) -> DepositProgress {
        DepositProgress {
            quantity: self.quantity,
            quantity_returned: self.quantity_returned,
            quantity_pending: self.quantity_pending,
        }
    }
}

/// Filters for listing deposits
#[derive(Debug, Default, Deserialize)]
pub struct DepositFilter {
    pub direction: Option<DepositDirection>,
    pub status: Option<DepositStatus>,
    pub deposit_type_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

/// Dashboard summary of the deposit ledger
#[derive(Debug, Default, Serialize, FromRow)]
pub struct DepositStats {
    pub active_deposits: i64,
    pub total_units_out: i64,
    pub total_deposits_amount: Decimal,
    pub total_penalties: Decimal,
}

const DEPOSIT_COLUMNS: &str = "id, reference, direction, customer_id, supplier_id, deposit_type_id, \
                               quantity, unit_deposit_amount, total_deposit_amount, quantity_returned, \
                               quantity_pending, status, notes, recorded_by, created_at, updated_at";

/// Locked view of a packaging type inside a ledger transaction
#[derive(Debug, FromRow)]
pub(crate) struct LockedType {
    pub(crate) code: String,
    pub(crate) unit_deposit_amount: Decimal,
    pub(crate) current_stock: i32,
    pub(crate) is_active: bool,
}

impl DepositService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Issue packaging to a customer against a deposit
    pub async fn issue_outgoing(
        &self,
        recorded_by: Uuid,
        input: IssueOutgoingInput,
    ) -> AppResult<Deposit> {
        input.validate()?;
        self.issue(
            DepositDirection::Outgoing,
            Some(input.customer_id),
            None,
            input.deposit_type_id,
            input.quantity,
            input.unit_deposit_amount,
            input.notes,
            recorded_by,
        )
        .await
    }

    /// Record packaging received from a supplier against a deposit
    pub async fn issue_incoming(
        &self,
        recorded_by: Uuid,
        input: IssueIncomingInput,
    ) -> AppResult<Deposit> {
        input.validate()?;
        self.issue(
            DepositDirection::Incoming,
            None,
            Some(input.supplier_id),
            input.deposit_type_id,
            input.quantity,
            input.unit_deposit_amount,
            input.notes,
            recorded_by,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn issue(
        &self,
        direction: DepositDirection,
        customer_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
        deposit_type_id: Uuid,
        quantity: i32,
        unit_deposit_amount: Option<Decimal>,
        notes: Option<String>,
        recorded_by: Uuid,
    ) -> AppResult<Deposit> {
        let mut tx = self.db.begin().await?;

        let deposit_type = lock_deposit_type(&mut tx, deposit_type_id).await?;

        if !deposit_type.is_active {
            return Err(AppError::DepositTypeInactive(deposit_type.code));
        }

        // Price captured at issue time so later catalog changes do not
        // rewrite history
        let unit_amount = unit_deposit_amount.unwrap_or(deposit_type.unit_deposit_amount);
        if let Err(msg) = validate_deposit_amount(unit_amount) {
            return Err(AppError::Validation {
                field: "unit_deposit_amount".to_string(),
                message: msg.to_string(),
                message_fr: "Le montant de consigne ne peut pas être négatif".to_string(),
            });
        }

        let new_stock = deposit_type.current_stock + direction.stock_delta_on_issue(quantity);
        if new_stock < 0 {
            return Err(AppError::InsufficientStock(format!(
                "only {} unit(s) of {} available",
                deposit_type.current_stock, deposit_type.code
            )));
        }

        sqlx::query("UPDATE deposit_types SET current_stock = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_stock)
            .bind(deposit_type_id)
            .execute(&mut *tx)
            .await?;

        let reference = reference_for(direction.reference_prefix(), Utc::now().date_naive());
        let total_deposit_amount = unit_amount * Decimal::from(quantity);

        let deposit = sqlx::query_as::<_, Deposit>(&format!(
            r#"
            INSERT INTO deposits (
                reference, direction, customer_id, supplier_id, deposit_type_id,
                quantity, unit_deposit_amount, total_deposit_amount,
                quantity_returned, quantity_pending, status, notes, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $6, $9, $10, $11)
            RETURNING {DEPOSIT_COLUMNS}
            "#,
        ))
        .bind(&reference)
        .bind(direction.as_str())
        .bind(customer_id)
        .bind(supplier_id)
        .bind(deposit_type_id)
        .bind(quantity)
        .bind(unit_amount)
        .bind(total_deposit_amount)
        .bind(DepositStatus::Active.as_str())
        .bind(&notes)
        .bind(recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            reference = %deposit.reference,
            direction = %deposit.direction,
            quantity,
            "deposit issued"
        );

        Ok(deposit)
    }

    /// Get a deposit by ID
    pub async fn get(&self, deposit_id: Uuid) -> AppResult<Deposit> {
        let deposit = sqlx::query_as::<_, Deposit>(&format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE id = $1",
        ))
        .bind(deposit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Deposit".to_string()))?;

        Ok(deposit)
    }

    /// List deposits matching the filter
    pub async fn list(&self, filter: DepositFilter) -> AppResult<Vec<Deposit>> {
        let deposits = sqlx::query_as::<_, Deposit>(&format!(
            r#"
            SELECT {DEPOSIT_COLUMNS}
            FROM deposits
            WHERE ($1::text IS NULL OR direction = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR deposit_type_id = $3)
              AND ($4::uuid IS NULL OR customer_id = $4)
              AND ($5::uuid IS NULL OR supplier_id = $5)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(filter.direction.map(|d| d.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.deposit_type_id)
        .bind(filter.customer_id)
        .bind(filter.supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(deposits)
    }

    /// List deposits still waiting on returns
    pub async fn list_pending(&self) -> AppResult<Vec<Deposit>> {
        let deposits = sqlx::query_as::<_, Deposit>(&format!(
            r#"
            SELECT {DEPOSIT_COLUMNS}
            FROM deposits
            WHERE status IN ('active', 'partially_returned')
            ORDER BY created_at DESC
            "#,
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(deposits)
    }

    /// Administratively close a deposit whose packaging will never come back
    pub async fn write_off(&self, deposit_id: Uuid, notes: Option<String>) -> AppResult<Deposit> {
        let mut tx = self.db.begin().await?;

        let deposit = lock_deposit(&mut tx, deposit_id).await?;
        let status = deposit.status()?;

        if !status.can_write_off() {
            return Err(AppError::InvalidStateTransition(format!(
                "cannot write off a {} deposit",
                status.as_str()
            )));
        }

        let deposit = sqlx::query_as::<_, Deposit>(&format!(
            r#"
            UPDATE deposits
            SET status = $1, notes = COALESCE($2, notes), updated_at = NOW()
            WHERE id = $3
            RETURNING {DEPOSIT_COLUMNS}
            "#,
        ))
        .bind(DepositStatus::WrittenOff.as_str())
        .bind(&notes)
        .bind(deposit_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(deposit)
    }

    /// Delete a deposit that has no recorded returns, reversing its
    /// issue-time stock adjustment
    pub async fn delete(&self, deposit_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let deposit = lock_deposit(&mut tx, deposit_id).await?;

        let has_returns = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM deposit_returns WHERE deposit_id = $1 AND deleted_at IS NULL)",
        )
        .bind(deposit_id)
        .fetch_one(&mut *tx)
        .await?;

        if has_returns {
            return Err(AppError::DepositHasReturns);
        }

        let direction = deposit.direction()?;
        let deposit_type = lock_deposit_type(&mut tx, deposit.deposit_type_id).await?;

        // Undo the issue-time stock movement
        let new_stock = deposit_type.current_stock - direction.stock_delta_on_issue(deposit.quantity);
        if new_stock < 0 {
            return Err(AppError::InsufficientStock(format!(
                "deleting {} would drive stock of {} below zero",
                deposit.reference, deposit_type.code
            )));
        }

        sqlx::query("UPDATE deposit_types SET current_stock = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_stock)
            .bind(deposit.deposit_type_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM deposits WHERE id = $1")
            .bind(deposit_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Dashboard summary; advisory only, degrades to zeros instead of failing
    pub async fn stats(&self) -> DepositStats {
        match self.try_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("deposit stats query failed, returning zeros: {}", e);
                DepositStats::default()
            }
        }
    }

    async fn try_stats(&self) -> AppResult<DepositStats> {
        let stats = sqlx::query_as::<_, DepositStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM deposits
                 WHERE status IN ('active', 'partially_returned')) AS active_deposits,
                (SELECT COALESCE(SUM(quantity_pending), 0) FROM deposits
                 WHERE direction = 'outgoing'
                   AND status IN ('active', 'partially_returned')) AS total_units_out,
                (SELECT COALESCE(SUM(total_deposit_amount), 0) FROM deposits
                 WHERE status IN ('active', 'partially_returned')) AS total_deposits_amount,
                (SELECT COALESCE(SUM(total_penalty), 0) FROM deposit_returns
                 WHERE deleted_at IS NULL) AS total_penalties
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(stats)
    }
}

/// Lock a deposit row for the rest of the transaction
pub(crate) async fn lock_deposit(
    tx: &mut Transaction<'_, Postgres>,
    deposit_id: Uuid,
) -> AppResult<Deposit> {
    let deposit = sqlx::query_as::<_, Deposit>(&format!(
        "SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE id = $1 FOR UPDATE",
    ))
    .bind(deposit_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Deposit".to_string()))?;

    Ok(deposit)
}

/// Lock a packaging type row for the rest of the transaction
pub(crate) async fn lock_deposit_type(
    tx: &mut Transaction<'_, Postgres>,
    deposit_type_id: Uuid,
) -> AppResult<LockedType> {
    let deposit_type = sqlx::query_as::<_, LockedType>(
        r#"
        SELECT code, unit_deposit_amount, current_stock, is_active
        FROM deposit_types
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(deposit_type_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Packaging type".to_string()))?;

    Ok(deposit_type)
}
