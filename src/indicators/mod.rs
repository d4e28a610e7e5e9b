//! Technical indicators over plain `f64` slices.
//!
//! Every function takes equal-length input slices (oldest value first) plus
//! its window parameters and returns a `Vec<f64>` of the same length.
//! Positions without enough history hold `f64::NAN`; callers turn those into
//! nulls when the values are stored in a frame.
//!
//! SMA, EMA, RSI, MACD and ATR come from `rustalib` through
//! [`frame_indicator`], which is why those functions return a
//! `PolarsResult`. Warmup lengths follow the TA-Lib conventions the feature
//! names are taken from:
//!
//! * [`overlap`] - SMA, EMA, WMA
//! * [`momentum`] - ROC, MOM, directional movement, RSI, stochastics, MACD ...
//! * [`volatility`] - TRANGE, ATR, NATR
//! * [`volume`] - Chaikin A/D oscillator, money flow index
//! * [`statistic`] - BETA, CORREL, linear regression, STDDEV, VAR
//! * [`cycle`] - Hilbert transform cycle indicators
//! * [`pattern`] - candlestick pattern recognition

pub mod cycle;
pub mod momentum;
pub mod overlap;
pub mod pattern;
pub mod statistic;
pub mod volatility;
pub mod volume;

use polars::prelude::*;

/// Column name of single-input frames handed to `rustalib`
pub(crate) const VALUE: &str = "value";

/// Index of the first finite value, `values.len()` when there is none
pub(crate) fn first_finite(values: &[f64]) -> usize {
    values
        .iter()
        .position(|v| v.is_finite())
        .unwrap_or(values.len())
}

/// Runs `f` on the slice after its leading undefined values and re-aligns
/// the result with the original positions.
///
/// Chained indicators (a signal line over MACD, a stochastic over RSI) use
/// this so the warmup of the inner indicator is not treated as data.
pub(crate) fn on_finite_tail<F>(values: &[f64], f: F) -> Vec<f64>
where
    F: FnOnce(&[f64]) -> Vec<f64>,
{
    let start = first_finite(values);
    let mut out = vec![f64::NAN; start];
    if start < values.len() {
        out.extend(f(&values[start..]));
    }
    out
}

/// Runs a frame based `rustalib` indicator over equal-length columns and
/// realigns its output with the input.
///
/// The frame starts at the first row where every column is finite, so the
/// warmup of a chained input is not treated as data. Tails of at most
/// `lookback` rows never reach the library and give all `NaN`. Shorter
/// results are aligned on the last row, nulls become `NaN` and the first
/// `lookback` rows of the tail are masked.
pub(crate) fn frame_indicator<F>(
    columns: &[(&str, &[f64])],
    lookback: usize,
    f: F,
) -> PolarsResult<Vec<f64>>
where
    F: FnOnce(&DataFrame) -> PolarsResult<Series>,
{
    let n = columns.first().map_or(0, |(_, values)| values.len());
    let start = columns
        .iter()
        .map(|(_, values)| first_finite(values))
        .max()
        .unwrap_or(n);
    let mut out = vec![f64::NAN; n];
    let tail_len = n.saturating_sub(start);
    if tail_len <= lookback {
        return Ok(out);
    }

    let frame = DataFrame::new(
        columns
            .iter()
            .map(|(name, values)| Series::new((*name).into(), &values[start..]).into_column())
            .collect(),
    )?;
    let result = f(&frame)?.cast(&DataType::Float64)?;
    let result = result.f64()?;
    let skip = result.len().saturating_sub(tail_len);
    let offset = n - (result.len() - skip);
    for (slot, value) in out[offset..].iter_mut().zip(result.into_iter().skip(skip)) {
        *slot = value.unwrap_or(f64::NAN);
    }
    out[start..start + lookback]
        .iter_mut()
        .for_each(|v| *v = f64::NAN);
    Ok(out)
}

/// Overwrites the first `lookback` positions with `NaN`
pub(crate) fn mask_warmup(mut values: Vec<f64>, lookback: usize) -> Vec<f64> {
    let end = lookback.min(values.len());
    values[..end].iter_mut().for_each(|v| *v = f64::NAN);
    values
}

/// Highest value of the `period` values ending at `i`
pub(crate) fn highest(values: &[f64], i: usize, period: usize) -> f64 {
    values[i + 1 - period..=i]
        .iter()
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b))
}

/// Lowest value of the `period` values ending at `i`
pub(crate) fn lowest(values: &[f64], i: usize, period: usize) -> f64 {
    values[i + 1 - period..=i]
        .iter()
        .fold(f64::INFINITY, |a, &b| a.min(b))
}

/// Wilder smoothing: seeded with the mean of the first `period` values,
/// then `avg = (prev * (period - 1) + x) / period`
pub(crate) fn wilder_average(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    let p = period as f64;
    let mut avg = values[..period].iter().sum::<f64>() / p;
    out[period - 1] = avg;
    for i in period..n {
        avg = (avg * (p - 1.0) + values[i]) / p;
        out[i] = avg;
    }
    out
}

/// `numerator / denominator`, or 0 when the denominator vanishes
#[inline]
pub(crate) fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
pub(crate) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
