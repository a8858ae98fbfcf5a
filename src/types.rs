//! Core types and constants

/// Unique identifier for companies
pub type CompanyId = u64;

/// Exchange stock code, e.g. "2330"
pub type StockCode = String;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Percentage type (0.0 to 100.0)
pub type Percentage = f64;

/// Reported money amount (statement currency units)
pub type Amount = f64;

/// Tolerance used when comparing derived ratios
pub const RATIO_EPSILON: f64 = 1e-6;

/// Returns `Some(value)` only for finite numbers.
///
/// NaN or infinite inputs are treated as missing so they never leak into
/// scoring or filtering.
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
