//! Monetary helpers.
//!
//! All monetary values are persisted as integer cents. Dollar amounts only
//! exist at the request boundary and at presentation time.

/// Largest accepted dollar amount. Keeps every stored cent value, and sums
/// of them, far from `i64` saturation.
pub const MAX_DOLLARS: f64 = 1e11;

/// Converts a dollar amount to integer cents, rounding to the nearest cent.
///
/// Callers must check [`is_valid_dollars`] first; out-of-range input
/// saturates.
pub fn dollars_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

/// Returns true for finite amounts within `±MAX_DOLLARS`.
pub fn is_valid_dollars(dollars: f64) -> bool {
    dollars.is_finite() && dollars.abs() <= MAX_DOLLARS
}

/// Converts an optional dollar amount to optional cents.
pub fn optional_cents(dollars: Option<f64>) -> Option<i64> {
    dollars.map(dollars_to_cents)
}

/// Converts cents back to dollars for display.
pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Savings in cents. Negative when the deal closed above MSRP.
pub fn savings_cents(msrp: i64, selling_price: i64) -> i64 {
    msrp - selling_price
}

/// Savings as a percentage of MSRP, rounded to one decimal place.
///
/// Returns `0.0` when MSRP is not positive.
pub fn savings_percentage(msrp: i64, selling_price: i64) -> f64 {
    if msrp <= 0 {
        return 0.0;
    }
    let pct = savings_cents(msrp, selling_price) as f64 / msrp as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
