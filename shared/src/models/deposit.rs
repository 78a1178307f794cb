//! Deposit (consignment) ledger models
//!
//! A deposit tracks returnable packaging (crates, bottles) issued to a
//! customer or received from a supplier, together with the refundable amount
//! charged for it. The arithmetic here is pure; persistence lives in the
//! backend services.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Direction of a consignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositDirection {
    /// Packaging issued to a customer
    Outgoing,
    /// Packaging received from a supplier
    Incoming,
}

impl DepositDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositDirection::Outgoing => "outgoing",
            DepositDirection::Incoming => "incoming",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "outgoing" => Some(DepositDirection::Outgoing),
            "incoming" => Some(DepositDirection::Incoming),
            _ => None,
        }
    }

    /// Prefix used for human-readable transaction references
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            DepositDirection::Outgoing => "DEP-OUT",
            DepositDirection::Incoming => "DEP-IN",
        }
    }

    /// Change applied to the packaging type's on-site stock when the deposit
    /// is issued. Issuing to a customer takes empty units off the shelf;
    /// receiving from a supplier adds them.
    pub fn stock_delta_on_issue(&self, quantity: i32) -> i32 {
        match self {
            DepositDirection::Outgoing => -quantity,
            DepositDirection::Incoming => quantity,
        }
    }

    /// Change applied to on-site stock when units in good condition come
    /// back: an outgoing return brings packaging into the shop, an incoming
    /// return sends it back to the supplier.
    pub fn stock_delta_on_return(&self, good_condition: i32) -> i32 {
        match self {
            DepositDirection::Outgoing => good_condition,
            DepositDirection::Incoming => -good_condition,
        }
    }
}

/// Lifecycle of a deposit
///
/// `active -> partially_returned -> completed`, with `written_off` as an
/// administrative terminal state reachable from either live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Active,
    PartiallyReturned,
    Completed,
    WrittenOff,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Active => "active",
            DepositStatus::PartiallyReturned => "partially_returned",
            DepositStatus::Completed => "completed",
            DepositStatus::WrittenOff => "written_off",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(DepositStatus::Active),
            "partially_returned" => Some(DepositStatus::PartiallyReturned),
            "completed" => Some(DepositStatus::Completed),
            "written_off" => Some(DepositStatus::WrittenOff),
            _ => None,
        }
    }

    /// A deposit still waiting on returns
    pub fn is_open(&self) -> bool {
        matches!(self, DepositStatus::Active | DepositStatus::PartiallyReturned)
    }

    /// Returns can only be recorded against open deposits
    pub fn accepts_returns(&self) -> bool {
        self.is_open()
    }

    /// Write-off is allowed only from a live state
    pub fn can_write_off(&self) -> bool {
        self.is_open()
    }
}

/// A deposit ledger rule violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerRule {
    #[error("return quantity exceeds pending quantity ({pending} pending)")]
    ExceedsPending { pending: i32 },

    #[error("condition split does not sum to the returned quantity")]
    SplitMismatch,

    #[error("deposit no longer accepts returns")]
    DepositClosed,

    #[error("stock adjustment would drive packaging stock below zero")]
    InsufficientStock,
}

/// Issued/returned/pending counters of a deposit
///
/// Invariant: `quantity_returned + quantity_pending == quantity` and
/// `quantity_pending >= 0` after every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositProgress {
    pub quantity: i32,
    pub quantity_returned: i32,
    pub quantity_pending: i32,
}

impl DepositProgress {
    /// Counters of a freshly issued deposit
    pub fn new(quantity: i32) -> Self {
        Self {
            quantity,
            quantity_returned: 0,
            quantity_pending: quantity,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.quantity_pending >= 0
            && self.quantity_returned >= 0
            && self.quantity_returned + self.quantity_pending == self.quantity
    }

    /// Apply a return of `quantity` units, rejecting anything beyond what is
    /// still pending.
    pub fn apply_return(&self, quantity: i32) -> Result<Self, LedgerRule> {
        if quantity > self.quantity_pending {
            return Err(LedgerRule::ExceedsPending {
                pending: self.quantity_pending,
            });
        }
        Ok(Self {
            quantity: self.quantity,
            quantity_returned: self.quantity_returned + quantity,
            quantity_pending: self.quantity_pending - quantity,
        })
    }

    /// Status implied by the counters after a return
    pub fn status(&self) -> DepositStatus {
        if self.quantity_pending == 0 {
            DepositStatus::Completed
        } else if self.quantity_returned > 0 {
            DepositStatus::PartiallyReturned
        } else {
            DepositStatus::Active
        }
    }
}

/// Good/damaged/lost breakdown of a return event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSplit {
    pub good_condition: i32,
    pub damaged: i32,
    pub lost: i32,
}

impl ReturnSplit {
    pub fn total(&self) -> i32 {
        self.good_condition + self.damaged + self.lost
    }

    /// The three buckets must sum to the returned quantity
    pub fn check(&self, quantity_returned: i32) -> Result<(), LedgerRule> {
        if self.good_condition < 0 || self.damaged < 0 || self.lost < 0 {
            return Err(LedgerRule::SplitMismatch);
        }
        if self.total() != quantity_returned {
            return Err(LedgerRule::SplitMismatch);
        }
        Ok(())
    }
}

/// Money side of a return: refund, penalties and the net amount handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnComputation {
    pub refund_amount: Decimal,
    pub damage_penalty: Decimal,
    pub delay_penalty: Decimal,
    pub total_penalty: Decimal,
    pub net_refund: Decimal,
}

impl ReturnComputation {
    /// Only units in good condition are refunded; penalties net against the
    /// refund but never below zero.
    pub fn compute(
        good_condition: i32,
        unit_deposit_amount: Decimal,
        damage_penalty: Decimal,
        delay_penalty: Decimal,
    ) -> Self {
        let refund_amount = Decimal::from(good_condition) * unit_deposit_amount;
        let total_penalty = damage_penalty + delay_penalty;
        let net_refund = (refund_amount - total_penalty).max(Decimal::ZERO);
        Self {
            refund_amount,
            damage_penalty,
            delay_penalty,
            total_penalty,
            net_refund,
        }
    }
}

/// Request body for issuing an outgoing deposit
#[derive(Debug, Deserialize, Validate)]
pub struct IssueOutgoingInput {
    pub customer_id: Uuid,
    pub deposit_type_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Defaults to the packaging type's current unit amount
    pub unit_deposit_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Request body for issuing an incoming deposit
#[derive(Debug, Deserialize, Validate)]
pub struct IssueIncomingInput {
    pub supplier_id: Uuid,
    pub deposit_type_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_deposit_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Request body for processing a return against a deposit
#[derive(Debug, Deserialize, Validate)]
pub struct ProcessReturnInput {
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub good_condition: i32,
    #[validate(range(min = 0))]
    pub damaged: i32,
    #[validate(range(min = 0))]
    pub lost: i32,
    pub damage_penalty: Option<Decimal>,
    pub delay_penalty: Option<Decimal>,
    pub notes: Option<String>,
}

impl ProcessReturnInput {
    pub fn split(&self) -> ReturnSplit {
        ReturnSplit {
            good_condition: self.good_condition,
            damaged: self.damaged,
            lost: self.lost,
        }
    }
}

/// Request body for creating a packaging type
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepositTypeInput {
    #[validate(length(min = 3, max = 10))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub name_fr: Option<String>,
    pub unit_deposit_amount: Decimal,
    #[validate(range(min = 0))]
    pub initial_stock: Option<i32>,
}

/// Request body for updating a packaging type
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepositTypeInput {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub name_fr: Option<String>,
    pub unit_deposit_amount: Option<Decimal>,
    pub is_active: Option<bool>,
}
