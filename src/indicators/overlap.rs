//! Moving averages.

use polars::prelude::PolarsResult;
use rustalib::indicators::moving_averages::{calculate_ema, calculate_sma};

use super::{frame_indicator, on_finite_tail, VALUE};

/// Simple moving average; first value at index `period - 1`
pub fn sma(values: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    frame_indicator(&[(VALUE, values)], period.saturating_sub(1), |df| {
        calculate_sma(df, VALUE, period)
    })
}

/// Exponential moving average with `k = 2 / (period + 1)`; first value at
/// index `period - 1`
pub fn ema(values: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    frame_indicator(&[(VALUE, values)], period.saturating_sub(1), |df| {
        calculate_ema(df, VALUE, period)
    })
}

/// Linearly weighted moving average: weight `j + 1` for the `j`-th oldest
/// value of the window, so the most recent value weighs `period`.
///
/// Leading undefined values are skipped, which lets it smooth the output
/// of another indicator directly.
pub fn wma(values: &[f64], period: usize) -> Vec<f64> {
    on_finite_tail(values, |tail| wma_dense(tail, period))
}

fn wma_dense(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    let p = period as f64;
    let divisor = p * (p + 1.0) / 2.0;

    let mut plain_sum = 0.0;
    let mut weighted_sum = 0.0;
    for (j, &v) in values[..period].iter().enumerate() {
        plain_sum += v;
        weighted_sum += (j + 1) as f64 * v;
    }
    out[period - 1] = weighted_sum / divisor;

    for i in period..n {
        // every weight drops by one, the new value enters with weight `period`
        weighted_sum += p * values[i] - plain_sum;
        plain_sum += values[i] - values[i - period];
        out[i] = weighted_sum / divisor;
    }
    out
}
