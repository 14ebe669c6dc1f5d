//! Alert classifier tests
//!
//! The classifiers are pure functions over (stock, reorder level) and days
//! until expiry; the tests pin the band edges and check ordering properties.

use proptest::prelude::*;

use shared::models::{expiry_severity, stock_severity, ExpirySeverity, StockSeverity};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Reference points for a reorder level of 50
    #[test]
    fn test_stock_bands_at_reorder_level_50() {
        assert_eq!(stock_severity(0, 50), Some(StockSeverity::OutOfStock));
        assert_eq!(stock_severity(24, 50), Some(StockSeverity::Critical));
        assert_eq!(stock_severity(40, 50), Some(StockSeverity::Warning));
        assert_eq!(stock_severity(60, 50), None);
    }

    /// Exactly half the reorder level is Warning, not Critical
    #[test]
    fn test_stock_half_reorder_boundary() {
        assert_eq!(stock_severity(25, 50), Some(StockSeverity::Warning));
        assert_eq!(stock_severity(24, 50), Some(StockSeverity::Critical));
    }

    /// Stock at the reorder level is healthy
    #[test]
    fn test_stock_at_reorder_level_is_healthy() {
        assert_eq!(stock_severity(50, 50), None);
        assert_eq!(stock_severity(49, 50), Some(StockSeverity::Warning));
    }

    /// Zero stock outranks everything, even with a zero reorder level
    #[test]
    fn test_zero_stock_always_out_of_stock() {
        assert_eq!(stock_severity(0, 0), Some(StockSeverity::OutOfStock));
        assert_eq!(stock_severity(0, 1000), Some(StockSeverity::OutOfStock));
    }

    #[test]
    fn test_zero_reorder_level_never_low() {
        assert_eq!(stock_severity(1, 0), None);
        assert_eq!(stock_severity(100, 0), None);
    }

    /// Reference points for the expiry bands
    #[test]
    fn test_expiry_bands() {
        assert_eq!(expiry_severity(-3), Some(ExpirySeverity::Expired));
        assert_eq!(expiry_severity(5), Some(ExpirySeverity::Critical));
        assert_eq!(expiry_severity(20), Some(ExpirySeverity::Warning));
        assert_eq!(expiry_severity(60), Some(ExpirySeverity::Info));
        assert_eq!(expiry_severity(120), None);
    }

    /// Band edges are inclusive: 7, 30, and 90 days
    #[test]
    fn test_expiry_band_edges() {
        assert_eq!(expiry_severity(0), Some(ExpirySeverity::Critical));
        assert_eq!(expiry_severity(7), Some(ExpirySeverity::Critical));
        assert_eq!(expiry_severity(8), Some(ExpirySeverity::Warning));
        assert_eq!(expiry_severity(30), Some(ExpirySeverity::Warning));
        assert_eq!(expiry_severity(31), Some(ExpirySeverity::Info));
        assert_eq!(expiry_severity(90), Some(ExpirySeverity::Info));
        assert_eq!(expiry_severity(91), None);
    }

    /// Severity strings as rendered into alert payloads
    #[test]
    fn test_severity_labels() {
        assert_eq!(StockSeverity::OutOfStock.as_str(), "out-of-stock");
        assert_eq!(StockSeverity::Critical.as_str(), "critical");
        assert_eq!(StockSeverity::Warning.as_str(), "warning");
        assert_eq!(ExpirySeverity::Expired.as_str(), "expired");
        assert_eq!(ExpirySeverity::Info.as_str(), "info");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn severity_rank(s: Option<StockSeverity>) -> u8 {
        match s {
            Some(StockSeverity::OutOfStock) => 3,
            Some(StockSeverity::Critical) => 2,
            Some(StockSeverity::Warning) => 1,
            None => 0,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Classification is a pure function of its inputs
        #[test]
        fn prop_stock_classification_deterministic(
            stock in 0i64..=10_000,
            reorder in 0i64..=10_000
        ) {
            prop_assert_eq!(
                stock_severity(stock, reorder),
                stock_severity(stock, reorder)
            );
        }

        /// Severity never increases as stock grows at a fixed reorder level
        #[test]
        fn prop_stock_severity_monotone_in_stock(
            stock in 0i64..=10_000,
            reorder in 0i64..=10_000
        ) {
            let now = severity_rank(stock_severity(stock, reorder));
            let after_restock = severity_rank(stock_severity(stock + 1, reorder));
            prop_assert!(after_restock <= now);
        }

        /// Stock at or above the reorder level never alerts
        #[test]
        fn prop_healthy_stock_never_alerts(
            reorder in 0i64..=10_000,
            surplus in 0i64..=10_000
        ) {
            // Zero stock is out-of-stock regardless of surplus arithmetic
            let stock = reorder + surplus;
            if stock > 0 {
                prop_assert_eq!(stock_severity(stock, reorder), None);
            }
        }

        /// Positive stock strictly below half the reorder level is critical
        #[test]
        fn prop_below_half_reorder_is_critical(
            reorder in 2i64..=10_000,
            stock in 1i64..=10_000
        ) {
            prop_assume!(2 * stock < reorder);
            prop_assert_eq!(stock_severity(stock, reorder), Some(StockSeverity::Critical));
        }

        /// Expiry severity never worsens as the horizon moves further out
        #[test]
        fn prop_expiry_severity_monotone(days in -3650i64..=3650) {
            fn rank(s: Option<ExpirySeverity>) -> u8 {
                match s {
                    Some(ExpirySeverity::Expired) => 4,
                    Some(ExpirySeverity::Critical) => 3,
                    Some(ExpirySeverity::Warning) => 2,
                    Some(ExpirySeverity::Info) => 1,
                    None => 0,
                }
            }
            prop_assert!(rank(expiry_severity(days + 1)) <= rank(expiry_severity(days)));
        }

        /// Every negative day count reads as expired
        #[test]
        fn prop_negative_days_always_expired(days in -3650i64..=-1) {
            prop_assert_eq!(expiry_severity(days), Some(ExpirySeverity::Expired));
        }

        /// Beyond 90 days nothing is flagged
        #[test]
        fn prop_far_future_never_flagged(days in 91i64..=36_500) {
            prop_assert_eq!(expiry_severity(days), None);
        }
    }
}
