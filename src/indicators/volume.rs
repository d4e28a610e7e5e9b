//! Volume weighted oscillators.

use polars::prelude::PolarsResult;

use super::overlap::ema;
use super::{mask_warmup, ratio_or_zero};

/// Chaikin accumulation/distribution line
pub fn ad(high: &[f64], low: &[f64], close: &[f64], volume: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    (0..close.len())
        .map(|i| {
            let range = high[i] - low[i];
            if range > 0.0 {
                acc += ((close[i] - low[i]) - (high[i] - close[i])) / range * volume[i];
            }
            acc
        })
        .collect()
}

/// Chaikin A/D oscillator: fast EMA minus slow EMA of the A/D line.
///
/// The output is defined once the slower average has seen a full window.
pub fn adosc(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    fast_period: usize,
    slow_period: usize,
) -> PolarsResult<Vec<f64>> {
    let line = ad(high, low, close, volume);
    let fast = ema(&line, fast_period)?;
    let slow = ema(&line, slow_period)?;
    let lookback = fast_period.max(slow_period).saturating_sub(1);
    let osc = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    Ok(mask_warmup(osc, lookback))
}

/// Money flow index; first value at index `period`
pub fn mfi(high: &[f64], low: &[f64], close: &[f64], volume: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n <= period {
        return out;
    }
    let typical: Vec<f64> = (0..n).map(|i| (high[i] + low[i] + close[i]) / 3.0).collect();

    // signed money flow per bar, split by direction of the typical price
    let mut positive = vec![0.0; n];
    let mut negative = vec![0.0; n];
    for i in 1..n {
        let flow = typical[i] * volume[i];
        if typical[i] > typical[i - 1] {
            positive[i] = flow;
        } else if typical[i] < typical[i - 1] {
            negative[i] = flow;
        }
    }

    for i in period..n {
        let pos: f64 = positive[i + 1 - period..=i].iter().sum();
        let neg: f64 = negative[i + 1 - period..=i].iter().sum();
        out[i] = 100.0 * ratio_or_zero(pos, pos + neg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_close;

    #[test]
    fn test_ad_accumulates_close_location() {
        let line = ad(&[10.0, 10.0], &[0.0, 0.0], &[10.0, 0.0], &[5.0, 2.0]);
        assert_close(line[0], 5.0);
        assert_close(line[1], 3.0);
    }

    #[test]
    fn test_adosc_warmup() {
        let n = 30;
        let high = vec![11.0; n];
        let low = vec![9.0; n];
        let close: Vec<f64> = (0..n).map(|i| 9.0 + (i % 3) as f64).collect();
        let volume = vec![100.0; n];
        let out = adosc(&high, &low, &close, &volume, 3, 9).unwrap();
        assert_eq!(out.len(), n);
        assert!(out[..8].iter().all(|v| v.is_nan()));
        assert!(out[20..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mfi_rising_prices_is_100() {
        let n = 20;
        let close: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();
        let volume = vec![1_000.0; n];
        let out = mfi(&high, &low, &close, &volume, 5);
        assert!(out[4].is_nan());
        assert_close(out[5], 100.0);
        assert_close(out[19], 100.0);
    }
}
