//! Harvest and crop tests
//!
//! - Yield per hectare and its zero-area guard
//! - Average yield per crop as shown on the super-admin dashboard
//! - Crop codes accepted by the forms

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{average_yield, crop_yield, CropType};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_yield_per_hectare() {
        assert_eq!(crop_yield(dec("150"), dec("3")), dec("50.00"));
        assert_eq!(crop_yield(dec("1000"), dec("2.5")), dec("400"));
    }

    #[test]
    fn test_yield_is_rounded_to_cents() {
        assert_eq!(crop_yield(dec("100"), dec("3")), dec("33.33"));
        assert_eq!(crop_yield(dec("200"), dec("3")), dec("66.67"));
    }

    #[test]
    fn test_zero_area_yields_zero() {
        assert_eq!(crop_yield(dec("500"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(crop_yield(dec("500"), dec("-1")), Decimal::ZERO);
    }

    #[test]
    fn test_average_is_mean_of_yields_not_ratio_of_totals() {
        // 100 kg on 1 ha and 900 kg on 9 ha: both 100 kg/ha
        let small = crop_yield(dec("100"), dec("1"));
        let large = crop_yield(dec("900"), dec("9"));
        assert_eq!(average_yield([small, large]), Some(dec("100")));

        // 100 kg on 1 ha and 100 kg on 4 ha: mean of 100 and 25
        let a = crop_yield(dec("100"), dec("1"));
        let b = crop_yield(dec("100"), dec("4"));
        assert_eq!(average_yield([a, b]), Some(dec("62.50")));
    }

    #[test]
    fn test_average_of_nothing() {
        assert_eq!(average_yield(Vec::<Decimal>::new()), None);
    }

    #[test]
    fn test_crop_codes_and_labels() {
        assert_eq!(CropType::from_str("MAIS").unwrap(), CropType::Maize);
        assert_eq!(CropType::from_str("SOJA").unwrap(), CropType::Soy);
        assert_eq!(CropType::from_str("ANANAS").unwrap(), CropType::Pineapple);
        assert_eq!(CropType::Maize.label(), "Maïs");
        assert!(CropType::from_str("COTON").is_err());
    }

    #[test]
    fn test_crop_type_wire_format() {
        let json = serde_json::to_string(&CropType::Pineapple).unwrap();
        assert_eq!(json, "\"ANANAS\"");
        let parsed: CropType = serde_json::from_str("\"SOJA\"").unwrap();
        assert_eq!(parsed, CropType::Soy);
    }
}

mod property_tests {
    use super::*;

    fn kg_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=5_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn area_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_yield_has_at_most_two_decimals(quantity in kg_strategy(), area in area_strategy()) {
            let y = crop_yield(quantity, area);
            prop_assert!(y.scale() <= 2);
            prop_assert!(y >= Decimal::ZERO);
        }

        #[test]
        fn prop_yield_times_area_is_close_to_quantity(quantity in kg_strategy(), area in area_strategy()) {
            let y = crop_yield(quantity, area);
            // Rounding to 0.01 kg/ha moves the product by at most half a cent per hectare
            let error = (y * area - quantity).abs();
            prop_assert!(error <= area * dec("0.005"));
        }

        #[test]
        fn prop_average_lies_between_extremes(
            yields in prop::collection::vec((1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2)), 1..20)
        ) {
            let avg = average_yield(yields.clone()).unwrap();
            let min = yields.iter().min().copied().unwrap();
            let max = yields.iter().max().copied().unwrap();
            prop_assert!(avg >= min.round_dp(2) - dec("0.01"));
            prop_assert!(avg <= max.round_dp(2) + dec("0.01"));
        }
    }
}
