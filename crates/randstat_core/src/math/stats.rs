//! Descriptive statistics over integer samples.
//!
//! The service reports dispersion with the population standard deviation
//! (divisor `n`), rounded to [`STDDEV_DECIMALS`] decimal places.

use crate::types::StatisticsError;

/// Number of decimal places kept in reported standard deviations.
pub const STDDEV_DECIMALS: i32 = 5;

/// Computes the population standard deviation of `values`.
///
/// `mean = Σv / n`, `variance = Σ(v - mean)² / n`, and the result is
/// `sqrt(variance)` rounded half away from zero to [`STDDEV_DECIMALS`]
/// decimal places.
///
/// # Errors
///
/// Returns [`StatisticsError::EmptyInput`] when `values` is empty.
///
/// # Examples
///
/// ```
/// use randstat_core::math::stats::population_std_dev;
///
/// assert_eq!(population_std_dev(&[1, 2, 3]).unwrap(), 0.8165);
/// assert_eq!(population_std_dev(&[5, 5, 5, 5]).unwrap(), 0.0);
/// assert!(population_std_dev(&[]).is_err());
/// ```
pub fn population_std_dev(values: &[i64]) -> Result<f64, StatisticsError> {
    if values.is_empty() {
        return Err(StatisticsError::EmptyInput);
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;

    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    Ok(round_to(variance.sqrt(), STDDEV_DECIMALS))
}

/// Rounds `value` half away from zero to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let ratio = 10_f64.powi(decimals);
    (value * ratio).round() / ratio
}
