//! Credit-payment ledger service
//!
//! Tracks payments against credit sales. The sale's `paid_amount` is the
//! authoritative running balance, mutated only here, inside a transaction
//! that locks the sale row first. Status flags (paid, overdue, ...) are
//! derived at read time from the amounts and due date.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::{CreditBalance, CreditRule, CreditStatus, RecordPaymentInput, VoidWindow};
use shared::validation::validate_payment_amount;

/// Credit ledger service
#[derive(Clone)]
pub struct CreditService {
    db: PgPool,
    void_window: VoidWindow,
}

/// A sale row, owned by the POS; the ledger reads it and moves `paid_amount`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_method: String,
    pub due_date: Option<NaiveDate>,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    pub fn balance(&self) -> CreditBalance {
        CreditBalance {
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
        }
    }
}

/// One payment event against a credit sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CreditPayment {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voided_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voided_by: Option<Uuid>,
}

/// Balances returned alongside payment mutations so the UI can re-render
/// without a second round trip
#[derive(Debug, Serialize)]
pub struct SaleBalance {
    pub sale_id: Uuid,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining: Decimal,
    pub is_fully_paid: bool,
}

impl SaleBalance {
    fn of(sale_id: Uuid, balance: CreditBalance) -> Self {
        Self {
            sale_id,
            total_amount: balance.total_amount,
            paid_amount: balance.paid_amount,
            remaining: balance.remaining(),
            is_fully_paid: balance.is_fully_paid(),
        }
    }
}

/// Result of recording a payment
#[derive(Debug, Serialize)]
pub struct PaymentOutcome {
    pub payment: CreditPayment,
    pub balance: SaleBalance,
}

/// A credit sale with its derived status, for listings
#[derive(Debug, Serialize)]
pub struct CreditSaleSummary {
    #[serde(flatten)]
    pub sale: Sale,
    pub remaining: Decimal,
    pub is_fully_paid: bool,
    pub is_overdue: bool,
    pub status: CreditStatus,
}

/// Outstanding credit position of one customer
#[derive(Debug, Default, Serialize, FromRow)]
pub struct CustomerCreditSummary {
    pub credit_sales: i64,
    pub total_credit: Decimal,
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
    pub overdue_sales: i64,
}

const SALE_COLUMNS: &str = "id, reference, customer_id, total_amount, paid_amount, payment_method, \
                            due_date, sale_date, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, sale_id, amount, method, payment_date, notes, recorded_by, \
                               created_at, voided_at, voided_by";

impl CreditService {
    pub fn new(db: PgPool, void_window: VoidWindow) -> Self {
        Self { db, void_window }
    }

    /// Record a payment against a credit sale
    pub async fn record_payment(
        &self,
        recorded_by: Uuid,
        input: RecordPaymentInput,
    ) -> AppResult<PaymentOutcome> {
        input.validate()?;

        if let Err(msg) = validate_payment_amount(input.amount) {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: msg.to_string(),
                message_fr: "Le montant du paiement doit être positif".to_string(),
            });
        }

        if input.method.is_credit() {
            return Err(AppError::Validation {
                field: "method".to_string(),
                message: "A credit payment cannot itself be settled on credit".to_string(),
                message_fr: "Un paiement ne peut pas être réglé à crédit".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let sale = lock_sale(&mut tx, input.sale_id).await?;

        if sale.payment_method != "credit" {
            return Err(CreditRule::NotACreditSale.into());
        }

        let updated = sale.balance().record_payment(input.amount)?;
        let payment_date = input.payment_date.unwrap_or_else(|| Utc::now().date_naive());

        let payment = sqlx::query_as::<_, CreditPayment>(&format!(
            r#"
            INSERT INTO credit_payments (sale_id, amount, method, payment_date, notes, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(input.sale_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(payment_date)
        .bind(&input.notes)
        .bind(recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE sales SET paid_amount = $1, updated_at = NOW() WHERE id = $2")
            .bind(updated.paid_amount)
            .bind(input.sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale = %sale.reference,
            amount = %payment.amount,
            remaining = %updated.remaining(),
            "credit payment recorded"
        );

        Ok(PaymentOutcome {
            payment,
            balance: SaleBalance::of(sale.id, updated),
        })
    }

    /// Void a recent payment, restoring the sale's balance
    pub async fn void_payment(&self, payment_id: Uuid, voided_by: Uuid) -> AppResult<SaleBalance> {
        let mut tx = self.db.begin().await?;

        let payment = sqlx::query_as::<_, CreditPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM credit_payments WHERE id = $1 FOR UPDATE",
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

        if payment.voided_at.is_some() {
            return Err(CreditRule::AlreadyVoided.into());
        }

        if !self.void_window.allows(payment.created_at, Utc::now()) {
            return Err(CreditRule::VoidWindowExpired.into());
        }

        let sale = lock_sale(&mut tx, payment.sale_id).await?;
        let updated = sale.balance().void_payment(payment.amount);

        sqlx::query("UPDATE credit_payments SET voided_at = NOW(), voided_by = $1 WHERE id = $2")
            .bind(voided_by)
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE sales SET paid_amount = $1, updated_at = NOW() WHERE id = $2")
            .bind(updated.paid_amount)
            .bind(payment.sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale = %sale.reference,
            amount = %payment.amount,
            "credit payment voided"
        );

        Ok(SaleBalance::of(sale.id, updated))
    }

    /// List non-voided payments recorded against a sale
    pub async fn list_payments(&self, sale_id: Uuid) -> AppResult<Vec<CreditPayment>> {
        let sale_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)")
                .bind(sale_id)
                .fetch_one(&self.db)
                .await?;

        if !sale_exists {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        let payments = sqlx::query_as::<_, CreditPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM credit_payments
            WHERE sale_id = $1 AND voided_at IS NULL
            ORDER BY payment_date DESC, created_at DESC
            "#,
        ))
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(payments)
    }

    /// List credit sales, optionally filtered by derived status. The status
    /// predicate is computed from the amounts and due date in the query, not
    /// read from a stored column.
    pub async fn list_credit_sales(
        &self,
        status: Option<CreditStatus>,
    ) -> AppResult<Vec<CreditSaleSummary>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE payment_method = 'credit'
              AND ($1::text IS NULL OR
                   CASE $1::text
                       WHEN 'paid' THEN paid_amount >= total_amount
                       WHEN 'overdue' THEN paid_amount < total_amount
                            AND due_date IS NOT NULL AND due_date < CURRENT_DATE
                       WHEN 'partial' THEN paid_amount > 0 AND paid_amount < total_amount
                            AND (due_date IS NULL OR due_date >= CURRENT_DATE)
                       WHEN 'unpaid' THEN paid_amount = 0
                            AND (due_date IS NULL OR due_date >= CURRENT_DATE)
                       ELSE TRUE
                   END)
            ORDER BY sale_date DESC, created_at DESC
            "#,
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        let today = Utc::now().date_naive();
        Ok(sales
            .into_iter()
            .map(|sale| {
                let balance = sale.balance();
                CreditSaleSummary {
                    remaining: balance.remaining(),
                    is_fully_paid: balance.is_fully_paid(),
                    is_overdue: balance.is_overdue(sale.due_date, today),
                    status: balance.status(sale.due_date, today),
                    sale,
                }
            })
            .collect())
    }

    /// Outstanding credit position of a customer across all their credit sales
    pub async fn customer_summary(&self, customer_id: Uuid) -> AppResult<CustomerCreditSummary> {
        let summary = sqlx::query_as::<_, CustomerCreditSummary>(
            r#"
            SELECT
                COUNT(*) AS credit_sales,
                COALESCE(SUM(total_amount), 0) AS total_credit,
                COALESCE(SUM(paid_amount), 0) AS total_paid,
                COALESCE(SUM(total_amount - paid_amount), 0) AS total_outstanding,
                COUNT(*) FILTER (WHERE paid_amount < total_amount
                                   AND due_date IS NOT NULL
                                   AND due_date < CURRENT_DATE) AS overdue_sales
            FROM sales
            WHERE payment_method = 'credit' AND customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }
}

/// Lock a sale row for the rest of the transaction
async fn lock_sale(tx: &mut Transaction<'_, Postgres>, sale_id: Uuid) -> AppResult<Sale> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE",
    ))
    .bind(sale_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

    Ok(sale)
}
