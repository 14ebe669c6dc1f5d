//! Batch ledger tests
//!
//! Covers FEFO consumption order, allocation planning, and the
//! never-negative stock rule under simulated concurrent decrements.

use chrono::{DateTime, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{plan_fefo_allocation, select_fefo, Batch, BatchStatus};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn batch(number: &str, quantity: i64, expiry: NaiveDate, seq: i64) -> Batch {
    Batch {
        id: Uuid::new_v4(),
        medicine_id: Uuid::nil(),
        batch_number: number.to_string(),
        quantity,
        manufacturing_date: date(2024, 1, 1),
        expiry_date: expiry,
        cost_price: Decimal::from(10),
        selling_price: Decimal::from(15),
        status: BatchStatus::Active,
        created_at: DateTime::from_timestamp(seq, 0).unwrap(),
        updated_at: DateTime::from_timestamp(seq, 0).unwrap(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Receiving order must not matter; expiry order decides consumption
    #[test]
    fn test_fefo_ignores_receiving_order() {
        let batches = vec![
            batch("FIRST-RECEIVED", 10, date(2025, 6, 1), 1),
            batch("SECOND-RECEIVED", 10, date(2025, 1, 1), 2),
            batch("THIRD-RECEIVED", 10, date(2025, 3, 1), 3),
        ];

        let next = select_fefo(&batches).unwrap();
        assert_eq!(next.batch_number, "SECOND-RECEIVED");
    }

    /// A request spanning batches drains them in expiry order
    #[test]
    fn test_allocation_spans_batches_in_expiry_order() {
        let batches = vec![
            batch("JUN", 20, date(2025, 6, 1), 1),
            batch("JAN", 5, date(2025, 1, 1), 2),
            batch("MAR", 8, date(2025, 3, 1), 3),
        ];

        let plan = plan_fefo_allocation(&batches, 15).unwrap();
        assert_eq!(plan[0], (batches[1].id, 5)); // JAN drained
        assert_eq!(plan[1], (batches[2].id, 8)); // MAR drained
        assert_eq!(plan[2], (batches[0].id, 2)); // JUN partial
    }

    /// Expired batches still participate; disposal is the only exclusion
    #[test]
    fn test_expired_but_active_batch_is_still_selected() {
        let batches = vec![
            batch("EXPIRED", 10, date(2020, 1, 1), 1),
            batch("FRESH", 10, date(2030, 1, 1), 2),
        ];

        let next = select_fefo(&batches).unwrap();
        assert_eq!(next.batch_number, "EXPIRED");
    }

    #[test]
    fn test_disposed_batch_never_selected() {
        let mut disposed = batch("DISPOSED", 10, date(2025, 1, 1), 1);
        disposed.status = BatchStatus::Disposed;
        let live = batch("LIVE", 10, date(2025, 6, 1), 2);

        let batches = [disposed, live];
        let next = select_fefo(&batches).unwrap();
        assert_eq!(next.batch_number, "LIVE");
    }

    #[test]
    fn test_allocation_fails_rather_than_overdrawing() {
        let batches = vec![
            batch("A", 3, date(2025, 1, 1), 1),
            batch("B", 4, date(2025, 2, 1), 2),
        ];

        assert!(plan_fefo_allocation(&batches, 7).is_some());
        assert!(plan_fefo_allocation(&batches, 8).is_none());
    }

    #[test]
    fn test_empty_ledger_has_no_candidate() {
        assert!(select_fefo(&[]).is_none());
        assert!(plan_fefo_allocation(&[], 1).is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for a shelf of batches with varied quantities and expiries
    fn shelf_strategy() -> impl Strategy<Value = Vec<Batch>> {
        prop::collection::vec((1i64..=500, 0u64..3650, 0i64..1000), 1..12).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (qty, expiry_offset, seq))| {
                    batch(
                        &format!("B{}", i),
                        qty,
                        date(2024, 1, 1) + chrono::Days::new(expiry_offset),
                        seq,
                    )
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// An allocation plan always covers exactly the requested quantity
        #[test]
        fn prop_allocation_covers_request_exactly(
            batches in shelf_strategy(),
            requested in 1i64..=200
        ) {
            let total: i64 = batches.iter().map(|b| b.quantity).sum();
            match plan_fefo_allocation(&batches, requested) {
                Some(plan) => {
                    prop_assert!(total >= requested);
                    let allocated: i64 = plan.iter().map(|(_, take)| take).sum();
                    prop_assert_eq!(allocated, requested);
                }
                None => prop_assert!(total < requested),
            }
        }

        /// No single batch is ever drawn below zero
        #[test]
        fn prop_allocation_never_overdraws_a_batch(
            batches in shelf_strategy(),
            requested in 1i64..=200
        ) {
            if let Some(plan) = plan_fefo_allocation(&batches, requested) {
                for (batch_id, take) in plan {
                    let source = batches.iter().find(|b| b.id == batch_id).unwrap();
                    prop_assert!(take > 0);
                    prop_assert!(take <= source.quantity);
                }
            }
        }

        /// Consumption order is non-decreasing in expiry date
        #[test]
        fn prop_allocation_respects_expiry_order(
            batches in shelf_strategy(),
            requested in 1i64..=200
        ) {
            if let Some(plan) = plan_fefo_allocation(&batches, requested) {
                let expiries: Vec<NaiveDate> = plan
                    .iter()
                    .map(|(id, _)| {
                        batches.iter().find(|b| b.id == *id).unwrap().expiry_date
                    })
                    .collect();
                for pair in expiries.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
            }
        }

        /// Every batch before the last in the plan is fully drained
        #[test]
        fn prop_partial_draw_only_on_last_batch(
            batches in shelf_strategy(),
            requested in 1i64..=200
        ) {
            if let Some(plan) = plan_fefo_allocation(&batches, requested) {
                for (batch_id, take) in &plan[..plan.len().saturating_sub(1)] {
                    let source = batches.iter().find(|b| b.id == *batch_id).unwrap();
                    prop_assert_eq!(*take, source.quantity);
                }
            }
        }
    }
}

// ============================================================================
// Conditional-Decrement Simulation
// ============================================================================

#[cfg(test)]
mod decrement_simulation {
    use super::*;

    /// The store-side rule: decrement succeeds only when covered
    fn try_consume(quantity: &mut i64, requested: i64) -> bool {
        if requested > 0 && *quantity >= requested {
            *quantity -= requested;
            true
        } else {
            false
        }
    }

    #[test]
    fn test_exact_depletion_reaches_zero() {
        let mut qty = 30;
        assert!(try_consume(&mut qty, 30));
        assert_eq!(qty, 0);
        assert!(!try_consume(&mut qty, 1));
    }

    #[test]
    fn test_oversized_request_rejected_without_change() {
        let mut qty = 30;
        assert!(!try_consume(&mut qty, 31));
        assert_eq!(qty, 30);
    }

    #[derive(Debug, PartialEq)]
    enum ConsumeFailure {
        Missing,
        Disposed,
        Insufficient { available: i64 },
    }

    /// A missed conditional decrement is explained from the batch state,
    /// the same way for direct consumption and for pinned sale lines
    fn classify_failure(batch: Option<(&str, i64)>) -> ConsumeFailure {
        match batch {
            None => ConsumeFailure::Missing,
            Some(("disposed", _)) => ConsumeFailure::Disposed,
            Some((_, available)) => ConsumeFailure::Insufficient { available },
        }
    }

    #[test]
    fn test_missed_decrement_keeps_failure_distinctions() {
        assert_eq!(classify_failure(None), ConsumeFailure::Missing);
        assert_eq!(
            classify_failure(Some(("disposed", 50))),
            ConsumeFailure::Disposed
        );
        assert_eq!(
            classify_failure(Some(("active", 3))),
            ConsumeFailure::Insufficient { available: 3 }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any interleaving of requests leaves the quantity non-negative,
        /// and accepted requests account for the entire drawdown
        #[test]
        fn prop_interleaved_consumption_never_negative(
            initial in 0i64..=1000,
            requests in prop::collection::vec(1i64..=100, 0..30)
        ) {
            let mut qty = initial;
            let mut consumed = 0;
            for request in requests {
                if try_consume(&mut qty, request) {
                    consumed += request;
                }
                prop_assert!(qty >= 0);
            }
            prop_assert_eq!(qty, initial - consumed);
        }
    }
}
