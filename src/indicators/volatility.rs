//! Range based volatility measures.

use polars::prelude::PolarsResult;
use rustalib::indicators::volatility::calculate_atr;

use super::{frame_indicator, ratio_or_zero};
use crate::constants::{CLOSE, HIGH, LOW};

/// True range; undefined on the first bar, which has no previous close
pub fn trange(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    for i in 1..n {
        let prev_close = close[i - 1];
        out[i] = high[i].max(prev_close) - low[i].min(prev_close);
    }
    out
}

/// Average true range; first value at index `period`
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    frame_indicator(&[(HIGH, high), (LOW, low), (CLOSE, close)], period, |df| {
        calculate_atr(df, period)
    })
}

/// ATR as a percentage of the close
pub fn natr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    Ok(atr(high, low, close, period)?
        .into_iter()
        .zip(close)
        .map(|(a, &c)| if a.is_nan() { a } else { ratio_or_zero(a, c) * 100.0 })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_close;

    #[test]
    fn test_trange_uses_previous_close() {
        let high = [10.0, 12.0, 11.0];
        let low = [9.0, 11.0, 8.0];
        let close = [9.5, 11.5, 10.0];
        let out = trange(&high, &low, &close);
        assert!(out[0].is_nan());
        // gap up: previous close 9.5 is below today's low
        assert_close(out[1], 12.0 - 9.5);
        assert_close(out[2], 11.5 - 8.0);
    }

    #[test]
    fn test_atr_constant_range() {
        let high = vec![11.0; 20];
        let low = vec![9.0; 20];
        let close = vec![10.0; 20];
        let out = atr(&high, &low, &close, 5).unwrap();
        assert_eq!(out.len(), 20);
        assert!(out[..5].iter().all(|v| v.is_nan()));
        assert_close(out[19], 2.0);
        let n = natr(&high, &low, &close, 5).unwrap();
        assert_close(n[19], 20.0);
        assert!(atr(&high[..3], &low[..3], &close[..3], 5).unwrap().iter().all(|v| v.is_nan()));
    }
}
