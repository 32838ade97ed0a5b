//! Display scaling for mixed count/seconds metrics.
//!
//! The metric table mixes event counters (millions of cache references,
//! misses, ...) with wall-clock times in seconds. Anything above
//! [`SCALE_THRESHOLD`] is treated as a count and shown in millions.

/// Values strictly above this are counts, at or below are seconds.
pub const SCALE_THRESHOLD: f64 = 100_000.0;

/// Divisor applied to counts.
pub const SCALE_DIVISOR: f64 = 1_000_000.0;

/// Returns `true` if `value` is displayed in millions.
pub fn is_count(value: f64) -> bool {
    value > SCALE_THRESHOLD
}

/// Scale a single value for plotting.
pub fn scale(value: f64) -> f64 {
    if is_count(value) {
        value / SCALE_DIVISOR
    } else {
        value
    }
}

/// Scale every value of a series, preserving order and length.
pub fn scale_all(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(scale).collect()
}

/// Bar label for a raw (unscaled) value: `12.34M` for counts, `0.01234` for seconds.
pub fn display_label(value: f64) -> String {
    if is_count(value) {
        format!("{:.2}M", value / SCALE_DIVISOR)
    } else {
        format!("{value:.5}")
    }
}
