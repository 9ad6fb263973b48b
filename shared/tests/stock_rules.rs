//! Property tests for the stock ledger rules
//!
//! - Entries always succeed and add exactly the moved quantity
//! - Exits never drive a stock below zero
//! - Alerts fire strictly below the threshold
//! - Accepted movements survive a `NUMERIC(10, 2)` round trip unchanged

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_movement, fill_rate, is_in_alert, validate_positive_quantity, MovementDirection,
    StockError, MAX_STORED_AMOUNT,
};

/// 0.01 kg to 100 000.00 kg
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn stock_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// 0.001 kg to 1 000.000 kg, including sub-cent values
fn fine_quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3))
}

/// What PostgreSQL keeps of a value written to a `NUMERIC(10, 2)` column
fn as_stored(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

fn direction_strategy() -> impl Strategy<Value = MovementDirection> {
    prop_oneof![Just(MovementDirection::In), Just(MovementDirection::Out)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_entry_adds_exactly(current in stock_strategy(), quantity in quantity_strategy()) {
        let after = apply_movement(current, MovementDirection::In, quantity).unwrap();
        prop_assert_eq!(after, current + quantity);
    }

    #[test]
    fn prop_exit_within_stock_subtracts(current in stock_strategy(), quantity in quantity_strategy()) {
        prop_assume!(quantity <= current);
        let after = apply_movement(current, MovementDirection::Out, quantity).unwrap();
        prop_assert_eq!(after, current - quantity);
        prop_assert!(after >= Decimal::ZERO);
    }

    #[test]
    fn prop_exit_beyond_stock_is_refused(current in stock_strategy(), excess in quantity_strategy()) {
        let requested = current + excess;
        let result = apply_movement(current, MovementDirection::Out, requested);
        prop_assert_eq!(
            result,
            Err(StockError::Insufficient { available: current, requested })
        );
    }

    /// Replaying any ledger leaves the balance equal to accepted entries minus accepted exits
    #[test]
    fn prop_ledger_balance_never_negative(
        movements in prop::collection::vec((direction_strategy(), quantity_strategy()), 1..30)
    ) {
        let mut balance = Decimal::ZERO;
        let mut accepted_in = Decimal::ZERO;
        let mut accepted_out = Decimal::ZERO;

        for (direction, quantity) in movements {
            if let Ok(next) = apply_movement(balance, direction, quantity) {
                match direction {
                    MovementDirection::In => accepted_in += quantity,
                    MovementDirection::Out => accepted_out += quantity,
                }
                balance = next;
            }
            prop_assert!(balance >= Decimal::ZERO);
        }

        prop_assert_eq!(balance, accepted_in - accepted_out);
    }

    /// The stored stock always equals the replay of the stored movement rows
    #[test]
    fn prop_stored_ledger_replays_exactly(
        movements in prop::collection::vec((direction_strategy(), fine_quantity_strategy()), 1..30)
    ) {
        let mut stored_stock = Decimal::ZERO;
        let mut stored_movements = Vec::new();

        for (direction, quantity) in movements {
            if let Ok(next) = apply_movement(stored_stock, direction, quantity) {
                prop_assert_eq!(as_stored(next), next);
                prop_assert_eq!(as_stored(quantity), quantity);
                stored_stock = as_stored(next);
                stored_movements.push((direction, as_stored(quantity)));
            }
        }

        let replayed = stored_movements
            .iter()
            .fold(Decimal::ZERO, |balance, (direction, quantity)| match direction {
                MovementDirection::In => balance + quantity,
                MovementDirection::Out => balance - quantity,
            });
        prop_assert_eq!(replayed, stored_stock);
    }

    /// Validation and the ledger rule agree on which quantities are acceptable
    #[test]
    fn prop_validation_matches_ledger(quantity in fine_quantity_strategy()) {
        let accepted = apply_movement(Decimal::ZERO, MovementDirection::In, quantity).is_ok();
        prop_assert_eq!(validate_positive_quantity(quantity).is_ok(), accepted);
    }

    #[test]
    fn prop_alert_is_strict(current in stock_strategy(), threshold in stock_strategy()) {
        prop_assert_eq!(is_in_alert(Some(current), Some(threshold)), current < threshold);
        prop_assert!(!is_in_alert(Some(threshold), Some(threshold)));
    }

    #[test]
    fn prop_fill_rate_within_bounds(stock in stock_strategy(), capacity in quantity_strategy()) {
        prop_assume!(stock <= capacity);
        let rate = fill_rate(stock, capacity);
        prop_assert!(rate >= Decimal::ZERO);
        prop_assert!(rate <= Decimal::ONE_HUNDRED);
    }
}

#[test]
fn test_missing_values_never_alert() {
    assert!(!is_in_alert(None, Some(Decimal::from(100))));
    assert!(!is_in_alert(Some(Decimal::ZERO), None));
    assert!(!is_in_alert(None, None));
}

#[test]
fn test_zero_quantity_is_rejected_both_ways() {
    for direction in [MovementDirection::In, MovementDirection::Out] {
        assert_eq!(
            apply_movement(Decimal::from(50), direction, Decimal::ZERO),
            Err(StockError::NonPositiveQuantity(Decimal::ZERO))
        );
    }
}

#[test]
fn test_sub_cent_exit_keeps_ledger_consistent() {
    let stock = Decimal::from(100);
    let quantity = Decimal::new(99_995, 3);

    assert_eq!(
        apply_movement(stock, MovementDirection::Out, quantity),
        Err(StockError::Unstorable(quantity))
    );
    assert!(validate_positive_quantity(quantity).is_err());
    assert!(validate_positive_quantity(Decimal::new(4, 3)).is_err());
}

#[test]
fn test_entry_beyond_column_range_is_refused() {
    let result = apply_movement(MAX_STORED_AMOUNT, MovementDirection::In, Decimal::new(1, 2));
    assert!(matches!(result, Err(StockError::Unstorable(_))));
    assert!(validate_positive_quantity(MAX_STORED_AMOUNT + Decimal::ONE).is_err());
}
