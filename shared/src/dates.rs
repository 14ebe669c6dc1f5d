//! Date handling for imports and calendar-aligned analytics
//!
//! Bulk import sources arrive with wildly inconsistent date encodings:
//! spreadsheet serial numbers, day-month-year with `-` or `/`, and ISO
//! strings, sometimes in the same file. The parser here is total — it always
//! produces a date — because a single bad cell must never block an import.

use chrono::{Datelike, Months, NaiveDate};

/// Spreadsheet serial day 0 (the Excel/LibreOffice epoch)
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Plausible serial-day window, roughly 1927..2091. Values outside it are
/// treated as something other than a serial (e.g. a bare year).
const SERIAL_MIN: f64 = 10_000.0;
const SERIAL_MAX: f64 = 70_000.0;

/// Replacement expiry window applied when a row's dates are unusable
pub const DEFAULT_EXPIRY_WINDOW_MONTHS: u32 = 24;

/// Parse a date from heterogeneous import input, defaulting to `today`
///
/// Tries, in order: spreadsheet serial days, `dd-mm-yyyy`, `dd/mm/yyyy`,
/// then ISO `yyyy-mm-dd`. Never fails.
pub fn parse_flexible_date(raw: &str, today: NaiveDate) -> NaiveDate {
    let value = raw.trim();
    if value.is_empty() {
        return today;
    }

    if let Some(date) = parse_serial_date(value) {
        return date;
    }

    for format in ["%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date;
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date;
    }

    today
}

/// Interpret a numeric cell as days since the spreadsheet epoch
fn parse_serial_date(value: &str) -> Option<NaiveDate> {
    if !value
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    let serial: f64 = value.parse().ok()?;
    if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_days(chrono::Days::new(serial as u64))
}

/// Enforce `manufacturing_date < expiry_date` on an imported pair
///
/// Missing values default to `today`; a violated ordering discards both and
/// substitutes (`today`, `today` + 2 years). Conservative on purpose: the
/// import carries on and the batch surfaces through expiry alerts normally.
pub fn normalize_date_pair(
    manufacturing: Option<NaiveDate>,
    expiry: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let fallback_expiry = default_expiry(today);
    match (manufacturing, expiry) {
        (Some(mfg), Some(exp)) if mfg < exp => (mfg, exp),
        (None, Some(exp)) if today < exp => (today, exp),
        (Some(mfg), None) if mfg < fallback_expiry => (mfg, fallback_expiry),
        _ => (today, fallback_expiry),
    }
}

/// `today` plus the default shelf-life window
pub fn default_expiry(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(DEFAULT_EXPIRY_WINDOW_MONTHS))
        .unwrap_or(today)
}

/// Monday of the calendar week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Days::new(date.weekday().num_days_from_monday() as u64)
}

/// First day of the calendar month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// First day of the month after the one containing `date`
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .unwrap_or(date)
}
