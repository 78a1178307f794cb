//! Credit ledger tests
//!
//! Tests for credit payments including:
//! - Remaining balance and over-payment rejection
//! - Derived status (unpaid/partial/paid/overdue), never stored
//! - Void window boundary
//! - Paid amount always equals the sum of non-voided payments

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{CreditBalance, CreditRule, CreditStatus, VoidWindow};
use shared::validation::validate_payment_amount;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Scenario: sale of 10000; 12000 is rejected, 4000 is accepted
    #[test]
    fn test_overpayment_rejected_then_partial_accepted() {
        let balance = CreditBalance {
            total_amount: dec("10000"),
            paid_amount: Decimal::ZERO,
        };

        let err = balance.record_payment(dec("12000")).unwrap_err();
        assert_eq!(
            err,
            CreditRule::ExceedsRemaining {
                remaining: dec("10000")
            }
        );

        let updated = balance.record_payment(dec("4000")).unwrap();
        assert_eq!(updated.paid_amount, dec("4000"));
        assert_eq!(updated.remaining(), dec("6000"));
        assert!(!updated.is_fully_paid());
    }

    /// Paying exactly the remaining balance settles the sale
    #[test]
    fn test_exact_payment_settles() {
        let balance = CreditBalance {
            total_amount: dec("10000"),
            paid_amount: dec("4000"),
        };

        let updated = balance.record_payment(dec("6000")).unwrap();
        assert_eq!(updated.remaining(), Decimal::ZERO);
        assert!(updated.is_fully_paid());
    }

    /// Voiding restores the balance the payment had consumed
    #[test]
    fn test_void_restores_balance() {
        let balance = CreditBalance {
            total_amount: dec("10000"),
            paid_amount: Decimal::ZERO,
        };

        let paid = balance.record_payment(dec("4000")).unwrap();
        let restored = paid.void_payment(dec("4000"));

        assert_eq!(restored.paid_amount, Decimal::ZERO);
        assert_eq!(restored.remaining(), dec("10000"));
    }

    /// Scenario: a payment created 25 hours ago can no longer be voided,
    /// one created 1 hour ago can
    #[test]
    fn test_void_window() {
        let window = VoidWindow::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

        assert!(!window.allows(now - Duration::hours(25), now));
        assert!(window.allows(now - Duration::hours(1), now));
    }

    /// The window boundary itself is inclusive
    #[test]
    fn test_void_window_boundary() {
        let window = VoidWindow::hours(24);
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

        assert!(window.allows(now - Duration::hours(24), now));
        assert!(!window.allows(now - Duration::hours(24) - Duration::seconds(1), now));
    }

    #[test]
    fn test_status_derivation() {
        let today = date(2025, 1, 15);
        let future_due = Some(date(2025, 2, 1));
        let past_due = Some(date(2025, 1, 1));

        // unpaid, not yet due
        assert_eq!(
            CreditStatus::derive(dec("10000"), Decimal::ZERO, future_due, today),
            CreditStatus::Unpaid
        );
        // partially paid, not yet due
        assert_eq!(
            CreditStatus::derive(dec("10000"), dec("4000"), future_due, today),
            CreditStatus::Partial
        );
        // fully paid wins even past due
        assert_eq!(
            CreditStatus::derive(dec("10000"), dec("10000"), past_due, today),
            CreditStatus::Paid
        );
        // overdue wins over unpaid and partial once the due date has passed
        assert_eq!(
            CreditStatus::derive(dec("10000"), Decimal::ZERO, past_due, today),
            CreditStatus::Overdue
        );
        assert_eq!(
            CreditStatus::derive(dec("10000"), dec("4000"), past_due, today),
            CreditStatus::Overdue
        );
        // no due date never goes overdue
        assert_eq!(
            CreditStatus::derive(dec("10000"), dec("4000"), None, today),
            CreditStatus::Partial
        );
    }

    /// A sale due today is not overdue yet
    #[test]
    fn test_due_today_not_overdue() {
        let today = date(2025, 1, 15);
        assert_eq!(
            CreditStatus::derive(dec("10000"), Decimal::ZERO, Some(today), today),
            CreditStatus::Unpaid
        );
    }

    #[test]
    fn test_payment_amount_validation() {
        assert!(validate_payment_amount(dec("4000")).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount(dec("-1")).is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            CreditStatus::Unpaid,
            CreditStatus::Partial,
            CreditStatus::Paid,
            CreditStatus::Overdue,
        ] {
            assert_eq!(CreditStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(CreditStatus::from_str("settled"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Paid amount always equals the sum of accepted (non-voided)
        /// payments and never exceeds the total
        #[test]
        fn prop_paid_amount_tracks_payments(
            total in amount_strategy(),
            amounts in prop::collection::vec(amount_strategy(), 0..10)
        ) {
            let mut balance = CreditBalance {
                total_amount: total,
                paid_amount: Decimal::ZERO,
            };
            let mut accepted = Decimal::ZERO;

            for amount in amounts {
                match balance.record_payment(amount) {
                    Ok(updated) => {
                        balance = updated;
                        accepted += amount;
                    }
                    Err(CreditRule::ExceedsRemaining { remaining }) => {
                        prop_assert_eq!(remaining, balance.remaining());
                        prop_assert!(amount > remaining);
                    }
                    Err(other) => prop_assert!(false, "unexpected rule: {:?}", other),
                }

                prop_assert_eq!(balance.paid_amount, accepted);
                prop_assert!(balance.paid_amount <= balance.total_amount);
            }
        }

        /// Recording then voiding a payment is an exact inverse
        #[test]
        fn prop_void_is_inverse(
            total in amount_strategy(),
            amount in amount_strategy()
        ) {
            let balance = CreditBalance {
                total_amount: total,
                paid_amount: Decimal::ZERO,
            };

            if let Ok(paid) = balance.record_payment(amount) {
                let restored = paid.void_payment(amount);
                prop_assert_eq!(restored.paid_amount, balance.paid_amount);
                prop_assert_eq!(restored.remaining(), balance.remaining());
            }
        }

        /// Derived status is consistent with the balance flags
        #[test]
        fn prop_status_consistent_with_flags(
            total in amount_strategy(),
            paid_raw in amount_strategy()
        ) {
            let paid = paid_raw.min(total);
            let balance = CreditBalance { total_amount: total, paid_amount: paid };
            let today = date(2025, 1, 15);

            for due in [None, Some(date(2025, 1, 1)), Some(date(2025, 2, 1))] {
                let status = balance.status(due, today);
                if balance.is_fully_paid() {
                    prop_assert_eq!(status, CreditStatus::Paid);
                } else if balance.is_overdue(due, today) {
                    prop_assert_eq!(status, CreditStatus::Overdue);
                } else {
                    prop_assert!(matches!(status, CreditStatus::Unpaid | CreditStatus::Partial));
                }
            }
        }
    }
}

// ============================================================================
// Integration Test Helpers (simulating the payment transaction)
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    /// Simulate recording a payment against a locked sale row
    pub fn simulate_payment(
        balance: CreditBalance,
        is_credit_sale: bool,
        amount: Decimal,
    ) -> Result<CreditBalance, &'static str> {
        if !is_credit_sale {
            return Err("Not a credit sale");
        }
        validate_payment_amount(amount)?;
        balance
            .record_payment(amount)
            .map_err(|_| "Exceeds remaining balance")
    }

    #[test]
    fn test_simulate_payment_on_cash_sale_rejected() {
        let balance = CreditBalance {
            total_amount: dec("5000"),
            paid_amount: Decimal::ZERO,
        };
        assert!(simulate_payment(balance, false, dec("1000")).is_err());
    }

    #[test]
    fn test_simulate_payment_accepted() {
        let balance = CreditBalance {
            total_amount: dec("5000"),
            paid_amount: Decimal::ZERO,
        };
        let updated = simulate_payment(balance, true, dec("1000")).unwrap();
        assert_eq!(updated.paid_amount, dec("1000"));
    }

    #[test]
    fn test_simulate_zero_payment_rejected() {
        let balance = CreditBalance {
            total_amount: dec("5000"),
            paid_amount: Decimal::ZERO,
        };
        assert!(simulate_payment(balance, true, Decimal::ZERO).is_err());
    }
}
