//! Credit-payment ledger models
//!
//! A sale with `payment_method = credit` anchors a running balance:
//! `paid_amount` grows as payments land and shrinks when a recent payment is
//! voided. Status flags are always derived from the amounts and due date,
//! never stored.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// How a sale (or a credit payment) was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
    Card,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "mobile_money" => Some(PaymentMethod::MobileMoney),
            "card" => Some(PaymentMethod::Card),
            "credit" => Some(PaymentMethod::Credit),
            _ => None,
        }
    }

    pub fn is_credit(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }
}

/// Settlement status of a credit sale, recomputed at query time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Unpaid,
    Partial,
    Paid,
    Overdue,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Unpaid => "unpaid",
            CreditStatus::Partial => "partial",
            CreditStatus::Paid => "paid",
            CreditStatus::Overdue => "overdue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(CreditStatus::Unpaid),
            "partial" => Some(CreditStatus::Partial),
            "paid" => Some(CreditStatus::Paid),
            "overdue" => Some(CreditStatus::Overdue),
            _ => None,
        }
    }

    /// Derive the status from the authoritative amounts and due date.
    /// Overdue wins over unpaid/partial once the due date has passed with a
    /// balance remaining.
    pub fn derive(
        total_amount: Decimal,
        paid_amount: Decimal,
        due_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        if paid_amount >= total_amount {
            return CreditStatus::Paid;
        }
        if let Some(due) = due_date {
            if due < today {
                return CreditStatus::Overdue;
            }
        }
        if paid_amount > Decimal::ZERO {
            CreditStatus::Partial
        } else {
            CreditStatus::Unpaid
        }
    }
}

/// A credit ledger rule violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditRule {
    #[error("sale is not a credit sale")]
    NotACreditSale,

    #[error("payment exceeds the remaining balance ({remaining})")]
    ExceedsRemaining { remaining: Decimal },

    #[error("payment is too old to void")]
    VoidWindowExpired,

    #[error("payment is already voided")]
    AlreadyVoided,
}

/// The running balance of a credit sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
}

impl CreditBalance {
    pub fn remaining(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    pub fn is_fully_paid(&self) -> bool {
        self.paid_amount >= self.total_amount
    }

    pub fn is_overdue(&self, due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
        !self.is_fully_paid() && due_date.is_some_and(|due| due < today)
    }

    /// Record a payment, rejecting anything beyond the remaining balance.
    pub fn record_payment(&self, amount: Decimal) -> Result<Self, CreditRule> {
        let remaining = self.remaining();
        if amount > remaining {
            return Err(CreditRule::ExceedsRemaining { remaining });
        }
        Ok(Self {
            total_amount: self.total_amount,
            paid_amount: self.paid_amount + amount,
        })
    }

    /// Reverse a previously recorded payment.
    pub fn void_payment(&self, amount: Decimal) -> Self {
        Self {
            total_amount: self.total_amount,
            paid_amount: self.paid_amount - amount,
        }
    }

    pub fn status(&self, due_date: Option<NaiveDate>, today: NaiveDate) -> CreditStatus {
        CreditStatus::derive(self.total_amount, self.paid_amount, due_date, today)
    }
}

/// Grace window inside which a recorded payment may still be voided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoidWindow {
    hours: i64,
}

impl VoidWindow {
    pub fn hours(hours: i64) -> Self {
        Self { hours }
    }

    /// Can a payment created at `created_at` still be voided at `now`?
    pub fn allows(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at <= Duration::hours(self.hours)
    }
}

impl Default for VoidWindow {
    fn default() -> Self {
        Self { hours: 24 }
    }
}

/// Request body for recording a payment against a credit sale
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentInput {
    pub sale_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
