//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Ceil a f64 and clamp it to the usize range, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<usize, f64>(usize::MAX).unwrap_or(f64::MAX);
    cast::<f64, usize>(value.min(max).ceil()).unwrap_or(0)
}

/// Number of items implied by a fraction of `total`, rounded up and capped at `total`.
///
/// A fraction of `0.5` against 5 items selects 3.
#[must_use]
pub fn fraction_of(total: usize, fraction: f32) -> usize {
    // f32 odds widen imprecisely (0.1 -> 0.10000000149), so shave the noise before rounding up.
    const WIDEN_SLACK: f64 = 1e-6;
    let total_f = cast::<usize, f64>(total).unwrap_or(0.0);
    ceil_f64_to_usize(total_f * f64::from(fraction) - WIDEN_SLACK).min(total)
}

/// Convert a signed coordinate into a count, flooring negatives at zero.
#[must_use]
pub fn i32_to_usize(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Convert a count into the karma ledger space, saturating at `i64::MAX`.
#[must_use]
pub fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
