//! Validation helpers for the deposit and credit ledgers
//!
//! Pure field-level checks shared between the backend and the desktop
//! frontend (via WASM). Business rules that need database state live in the
//! backend services.

use rust_decimal::Decimal;

// ============================================================================
// Deposit Ledger Validations
// ============================================================================

/// Quantities on deposits and returns are whole packaging units, at least one
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Unit deposit amounts may be zero (non-refundable packaging) but never negative
pub fn validate_deposit_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Deposit amount cannot be negative");
    }
    Ok(())
}

/// Penalties are supplied amounts and cannot be negative
pub fn validate_penalty(penalty: Decimal) -> Result<(), &'static str> {
    if penalty < Decimal::ZERO {
        return Err("Penalty cannot be negative");
    }
    Ok(())
}

/// The good/damaged/lost buckets of a return must sum to the returned quantity
pub fn validate_return_split(
    good_condition: i32,
    damaged: i32,
    lost: i32,
    quantity: i32,
) -> Result<(), &'static str> {
    if good_condition < 0 || damaged < 0 || lost < 0 {
        return Err("Condition counts cannot be negative");
    }
    if good_condition + damaged + lost != quantity {
        return Err("Condition split must sum to the returned quantity");
    }
    Ok(())
}

/// Packaging type codes: 3-10 uppercase alphanumeric characters
pub fn validate_type_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Code must be at least 3 characters");
    }
    if code.len() > 10 {
        return Err("Code must be at most 10 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err("Code must be uppercase alphanumeric only");
    }
    Ok(())
}

/// Transaction references follow `PREFIX-YYYYMMDD-XXXXXX`
pub fn validate_reference(reference: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = reference.rsplitn(3, '-').collect();
    if parts.len() != 3 {
        return Err("Reference must be in format PREFIX-YYYYMMDD-XXXXXX");
    }
    // rsplitn yields suffix, date, prefix
    let (suffix, date, prefix) = (parts[0], parts[1], parts[2]);
    if prefix.is_empty() {
        return Err("Reference prefix missing");
    }
    if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return Err("Reference date must be 8 digits");
    }
    if suffix.len() != 6 || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Reference suffix must be 6 alphanumeric characters");
    }
    Ok(())
}

// ============================================================================
// Credit Ledger Validations
// ============================================================================

/// Payment amounts must be strictly positive
pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(24).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_deposit_amount() {
        assert!(validate_deposit_amount(dec("0")).is_ok());
        assert!(validate_deposit_amount(dec("100.00")).is_ok());
        assert!(validate_deposit_amount(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_penalty() {
        assert!(validate_penalty(dec("0")).is_ok());
        assert!(validate_penalty(dec("50")).is_ok());
        assert!(validate_penalty(dec("-50")).is_err());
    }

    #[test]
    fn test_validate_return_split_valid() {
        assert!(validate_return_split(8, 1, 1, 10).is_ok());
        assert!(validate_return_split(10, 0, 0, 10).is_ok());
        assert!(validate_return_split(0, 0, 5, 5).is_ok());
    }

    #[test]
    fn test_validate_return_split_mismatch() {
        assert!(validate_return_split(8, 1, 0, 10).is_err());
        assert!(validate_return_split(8, 2, 1, 10).is_err());
    }

    #[test]
    fn test_validate_return_split_negative() {
        assert!(validate_return_split(-1, 6, 5, 10).is_err());
        assert!(validate_return_split(11, -1, 0, 10).is_err());
    }

    #[test]
    fn test_validate_type_code() {
        assert!(validate_type_code("CR24").is_ok());
        assert!(validate_type_code("BTL1L").is_ok());
        assert!(validate_type_code("AB").is_err()); // too short
        assert!(validate_type_code("ABCDEFGHIJK").is_err()); // too long
        assert!(validate_type_code("cr24").is_err()); // lowercase
        assert!(validate_type_code("CR-24").is_err()); // special char
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference("DEP-OUT-20250115-4F2A9C").is_ok());
        assert!(validate_reference("DEP-IN-20250115-000001").is_ok());
        assert!(validate_reference("RET-20250115-A1B2C3").is_ok());
        assert!(validate_reference("DEP-OUT-2025-4F2A9C").is_err());
        assert!(validate_reference("DEP-OUT-20250115-XX").is_err());
        assert!(validate_reference("nonsense").is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(dec("0.01")).is_ok());
        assert!(validate_payment_amount(dec("4000")).is_ok());
        assert!(validate_payment_amount(dec("0")).is_err());
        assert!(validate_payment_amount(dec("-10")).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any split whose buckets sum to the quantity reconciles
            #[test]
            fn prop_split_sums_reconcile(good in 0i32..200, damaged in 0i32..200, lost in 0i32..200) {
                prop_assert!(validate_return_split(good, damaged, lost, good + damaged + lost).is_ok());
            }

            /// Positive quantities validate, non-positive ones never do
            #[test]
            fn prop_quantity_sign(quantity in -1000i32..1000) {
                prop_assert_eq!(validate_quantity(quantity).is_ok(), quantity >= 1);
            }
        }
    }
}
