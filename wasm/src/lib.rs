//! WebAssembly module for the SmartDrinkStore desktop frontend
//!
//! Provides client-side computation for:
//! - Return refund / penalty / net refund preview
//! - Return split validation before submission
//! - Credit status derivation and remaining balance display
//! - Void-window checks for the payment history panel

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn dec(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

/// Compute the money side of a return as JSON:
/// `{refund_amount, damage_penalty, delay_penalty, total_penalty, net_refund}`
#[wasm_bindgen]
pub fn compute_return(
    good_condition: i32,
    unit_deposit_amount: f64,
    damage_penalty: f64,
    delay_penalty: f64,
) -> Result<String, JsValue> {
    let computation = ReturnComputation::compute(
        good_condition,
        dec(unit_deposit_amount),
        dec(damage_penalty),
        dec(delay_penalty),
    );
    serde_json::to_string(&computation)
        .map_err(|e| JsValue::from_str(&format!("serialization error: {}", e)))
}

/// Validate a good/damaged/lost split against the returned quantity
#[wasm_bindgen]
pub fn check_return_split(good_condition: i32, damaged: i32, lost: i32, quantity: i32) -> bool {
    validate_return_split(good_condition, damaged, lost, quantity).is_ok()
}

/// Units still pending after a return of `quantity`, or -1 when the return
/// exceeds what is pending
#[wasm_bindgen]
pub fn pending_after_return(quantity: i32, quantity_returned: i32, quantity_pending: i32, returned_now: i32) -> i32 {
    let progress = DepositProgress {
        quantity,
        quantity_returned,
        quantity_pending,
    };
    match progress.apply_return(returned_now) {
        Ok(updated) => updated.quantity_pending,
        Err(_) => -1,
    }
}

/// Remaining balance of a credit sale
#[wasm_bindgen]
pub fn remaining_balance(total_amount: f64, paid_amount: f64) -> f64 {
    let balance = CreditBalance {
        total_amount: dec(total_amount),
        paid_amount: dec(paid_amount),
    };
    balance.remaining().to_string().parse().unwrap_or(0.0)
}

/// Derive the credit status (`unpaid|partial|paid|overdue`) for display.
/// Dates are ISO `YYYY-MM-DD`; an empty due date means no due date.
#[wasm_bindgen]
pub fn derive_credit_status(
    total_amount: f64,
    paid_amount: f64,
    due_date: &str,
    today: &str,
) -> Result<String, JsValue> {
    let due = if due_date.is_empty() {
        None
    } else {
        Some(
            NaiveDate::parse_from_str(due_date, "%Y-%m-%d")
                .map_err(|e| JsValue::from_str(&format!("invalid due date: {}", e)))?,
        )
    };
    let today = NaiveDate::parse_from_str(today, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("invalid date: {}", e)))?;

    let status = CreditStatus::derive(dec(total_amount), dec(paid_amount), due, today);
    Ok(status.as_str().to_string())
}

/// Can a payment created at `created_at` (RFC 3339) still be voided?
#[wasm_bindgen]
pub fn can_void_payment(created_at: &str, window_hours: i32) -> Result<bool, JsValue> {
    let created: DateTime<Utc> = created_at
        .parse()
        .map_err(|e| JsValue::from_str(&format!("invalid timestamp: {}", e)))?;
    Ok(VoidWindow::hours(window_hours as i64).allows(created, Utc::now()))
}
