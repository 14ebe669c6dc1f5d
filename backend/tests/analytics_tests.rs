//! Analytics aggregation tests
//!
//! The dashboard attributes each sale to calendar windows (weeks start on
//! Monday) over half-open [start, end) intervals. These tests pin the window
//! arithmetic and the attribution rules against a pure in-memory sales log.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::dates::{month_start, next_month_start, week_start};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Sum of sale totals falling in the half-open interval [start, end)
fn revenue_between(sales: &[(NaiveDate, Decimal)], start: NaiveDate, end: NaiveDate) -> Decimal {
    sales
        .iter()
        .filter(|(day, _)| *day >= start && *day < end)
        .map(|(_, total)| *total)
        .sum()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A sale this Monday and one the previous Monday land in different weeks
    #[test]
    fn test_week_attribution_across_mondays() {
        // 2024-07-15 is a Monday
        let today = date(2024, 7, 15);
        let sales = vec![
            (date(2024, 7, 15), dec("100.00")),
            (date(2024, 7, 8), dec("50.00")),
        ];

        let this_week = week_start(today);
        let last_week = this_week - Days::new(7);

        assert_eq!(
            revenue_between(&sales, this_week, this_week + Days::new(7)),
            dec("100.00")
        );
        assert_eq!(revenue_between(&sales, last_week, this_week), dec("50.00"));
    }

    /// Sunday closes the week; the next day opens a new one
    #[test]
    fn test_sunday_monday_week_boundary() {
        let sunday = date(2024, 7, 14);
        let monday = date(2024, 7, 15);
        assert_eq!(week_start(sunday), date(2024, 7, 8));
        assert_eq!(week_start(monday), monday);

        let sales = vec![(sunday, dec("75.00"))];
        let this_week = week_start(monday);
        assert_eq!(
            revenue_between(&sales, this_week, this_week + Days::new(7)),
            Decimal::ZERO
        );
        assert_eq!(
            revenue_between(&sales, this_week - Days::new(7), this_week),
            dec("75.00")
        );
    }

    /// Today / yesterday windows are single half-open days
    #[test]
    fn test_daily_attribution() {
        let today = date(2024, 7, 15);
        let sales = vec![
            (today, dec("10.00")),
            (today - Days::new(1), dec("20.00")),
            (today - Days::new(2), dec("40.00")),
        ];

        assert_eq!(
            revenue_between(&sales, today, today + Days::new(1)),
            dec("10.00")
        );
        assert_eq!(
            revenue_between(&sales, today - Days::new(1), today),
            dec("20.00")
        );
    }

    /// Month windows track calendar months, including across year end
    #[test]
    fn test_month_attribution_across_year_end() {
        let today = date(2025, 1, 10);
        let sales = vec![
            (date(2025, 1, 2), dec("100.00")),
            (date(2024, 12, 31), dec("60.00")),
            (date(2024, 12, 1), dec("40.00")),
        ];

        let this_month = month_start(today);
        let next_month = next_month_start(today);
        let last_month = month_start(this_month - Days::new(1));

        assert_eq!(
            revenue_between(&sales, this_month, next_month),
            dec("100.00")
        );
        assert_eq!(
            revenue_between(&sales, last_month, this_month),
            dec("100.00")
        );
    }

    /// An empty log produces zeroed metrics, not errors
    #[test]
    fn test_empty_sales_log() {
        let today = date(2024, 7, 15);
        let this_week = week_start(today);
        assert_eq!(
            revenue_between(&[], this_week, this_week + Days::new(7)),
            Decimal::ZERO
        );
    }

    /// Turnover approximation: trailing-30-day COGS annualized over value
    #[test]
    fn test_turnover_estimate() {
        let cogs_30d = dec("500.00");
        let inventory_value = dec("2000.00");
        let turnover = cogs_30d * dec("12") / inventory_value;
        assert_eq!(turnover, dec("3"));
    }

    /// Fulfillment is completed over all sales in the window
    fn fulfillment(total: i64, completed: i64, with_status: i64) -> Decimal {
        if with_status == 0 || total == 0 {
            Decimal::from(100)
        } else {
            Decimal::from(completed) * Decimal::from(100) / Decimal::from(total)
        }
    }

    /// Fulfillment defaults to 100 when no sale carries a status
    #[test]
    fn test_fulfillment_without_status_data() {
        assert_eq!(fulfillment(0, 0, 0), dec("100"));
        assert_eq!(fulfillment(5, 0, 0), dec("100"));
    }

    /// Status-less sales count in the denominator once any status exists
    #[test]
    fn test_fulfillment_with_mixed_status_data() {
        // 4 sales, 2 completed, 1 pending, 1 with no status at all
        assert_eq!(fulfillment(4, 2, 3), dec("50"));
        assert_eq!(fulfillment(2, 2, 2), dec("100"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn day_strategy() -> impl Strategy<Value = NaiveDate> {
        (0u64..=3650).prop_map(|offset| date(2020, 1, 1) + Days::new(offset))
    }

    fn sales_strategy() -> impl Strategy<Value = Vec<(NaiveDate, Decimal)>> {
        prop::collection::vec(
            (0u64..=3650, 1i64..=100_000).prop_map(|(offset, cents)| {
                (date(2020, 1, 1) + Days::new(offset), Decimal::new(cents, 2))
            }),
            0..40,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// week_start always lands on a Monday at most six days back
        #[test]
        fn prop_week_start_is_monday(day in day_strategy()) {
            let start = week_start(day);
            prop_assert_eq!(start.weekday(), Weekday::Mon);
            prop_assert!(start <= day);
            prop_assert!(day - start <= chrono::Duration::days(6));
        }

        /// Every day of a week maps to the same week start
        #[test]
        fn prop_week_is_stable_across_its_days(day in day_strategy()) {
            let start = week_start(day);
            for offset in 0..7 {
                prop_assert_eq!(week_start(start + Days::new(offset)), start);
            }
        }

        /// Month windows tile the calendar: start <= day < next start
        #[test]
        fn prop_month_window_contains_day(day in day_strategy()) {
            let start = month_start(day);
            let end = next_month_start(day);
            prop_assert_eq!(start.day(), 1);
            prop_assert!(start <= day);
            prop_assert!(day < end);
        }

        /// Adjacent windows partition revenue: no sale counted twice or lost
        #[test]
        fn prop_adjacent_windows_partition_revenue(
            sales in sales_strategy(),
            day in day_strategy()
        ) {
            let this_week = week_start(day);
            let last_week = this_week - Days::new(7);
            let both = revenue_between(&sales, last_week, this_week + Days::new(7));
            let split = revenue_between(&sales, last_week, this_week)
                + revenue_between(&sales, this_week, this_week + Days::new(7));
            prop_assert_eq!(both, split);
        }

        /// Window totals never exceed the all-time total
        #[test]
        fn prop_window_bounded_by_total(
            sales in sales_strategy(),
            day in day_strategy()
        ) {
            let total: Decimal = sales.iter().map(|(_, t)| *t).sum();
            let this_month = revenue_between(
                &sales,
                month_start(day),
                next_month_start(day),
            );
            prop_assert!(this_month <= total);
        }
    }
}
