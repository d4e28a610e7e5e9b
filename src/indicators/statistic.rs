//! Rolling statistics and least-squares regression.

use polars::prelude::*;

use super::{ratio_or_zero, VALUE};

/// Beta of the one-bar returns of `y` against those of `x`.
///
/// Uses `period` return pairs, so the first value is at index `period`.
pub fn beta(x: &[f64], y: &[f64], period: usize) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n <= period {
        return out;
    }
    let returns = |s: &[f64], i: usize| ratio_or_zero(s[i] - s[i - 1], s[i - 1]);
    let p = period as f64;
    for i in period..n {
        let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
        for j in i + 1 - period..=i {
            let rx = returns(x, j);
            let ry = returns(y, j);
            sx += rx;
            sy += ry;
            sxx += rx * rx;
            sxy += rx * ry;
        }
        out[i] = ratio_or_zero(p * sxy - sx * sy, p * sxx - sx * sx);
    }
    out
}

/// Pearson correlation over a rolling window; first value at `period - 1`
pub fn correl(x: &[f64], y: &[f64], period: usize) -> Vec<f64> {
    let n = x.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    let p = period as f64;
    for i in period - 1..n {
        let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for j in i + 1 - period..=i {
            sx += x[j];
            sy += y[j];
            sxx += x[j] * x[j];
            syy += y[j] * y[j];
            sxy += x[j] * y[j];
        }
        let spread = (sxx - sx * sx / p) * (syy - sy * sy / p);
        out[i] = if spread > 0.0 {
            (sxy - sx * sy / p) / spread.sqrt()
        } else {
            0.0
        };
    }
    out
}

/// Least-squares line through a window, `x = 0` on the oldest value
#[derive(Debug, Clone, Copy)]
struct Fit {
    slope: f64,
    intercept: f64,
}

fn rolling_fit(values: &[f64], period: usize) -> Vec<Option<Fit>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period < 2 || n < period {
        return out;
    }
    let p = period as f64;
    let sum_x = p * (p - 1.0) / 2.0;
    let sum_xx = p * (p - 1.0) * (2.0 * p - 1.0) / 6.0;
    let divisor = p * sum_xx - sum_x * sum_x;
    for i in period - 1..n {
        let window = &values[i + 1 - period..=i];
        let sum_y: f64 = window.iter().sum();
        let sum_xy: f64 = window.iter().enumerate().map(|(k, y)| k as f64 * y).sum();
        let slope = (p * sum_xy - sum_x * sum_y) / divisor;
        let intercept = (sum_y - slope * sum_x) / p;
        out[i] = Some(Fit { slope, intercept });
    }
    out
}

fn map_fit(values: &[f64], period: usize, f: impl Fn(Fit) -> f64) -> Vec<f64> {
    rolling_fit(values, period)
        .into_iter()
        .map(|fit| fit.map_or(f64::NAN, &f))
        .collect()
}

/// Regression value at the most recent bar
pub fn linearreg(values: &[f64], period: usize) -> Vec<f64> {
    let last = period as f64 - 1.0;
    map_fit(values, period, |fit| fit.intercept + fit.slope * last)
}

/// Regression slope angle in degrees
pub fn linearreg_angle(values: &[f64], period: usize) -> Vec<f64> {
    map_fit(values, period, |fit| fit.slope.atan().to_degrees())
}

/// Regression value at the oldest bar of the window
pub fn linearreg_intercept(values: &[f64], period: usize) -> Vec<f64> {
    map_fit(values, period, |fit| fit.intercept)
}

pub fn linearreg_slope(values: &[f64], period: usize) -> Vec<f64> {
    map_fit(values, period, |fit| fit.slope)
}

/// Time series forecast: the regression line projected one bar ahead
pub fn tsf(values: &[f64], period: usize) -> Vec<f64> {
    let next = period as f64;
    map_fit(values, period, |fit| fit.intercept + fit.slope * next)
}

fn population_window(period: usize) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: period,
        min_periods: period,
        fn_params: Some(RollingFnParams::Var(RollingVarParams { ddof: 0 })),
        ..Default::default()
    }
}

fn to_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Population variance over a rolling window
pub fn var(values: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    let series = Series::new(VALUE.into(), values);
    to_values(&series.rolling_var(population_window(period))?)
}

/// Population standard deviation over a rolling window
pub fn stddev(values: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    let series = Series::new(VALUE.into(), values);
    to_values(&series.rolling_std(population_window(period))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_close;

    #[test]
    fn test_regression_on_a_line() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let period = 4;
        assert!(linearreg(&values, period)[2].is_nan());
        assert_close(linearreg(&values, period)[5], values[5]);
        assert_close(linearreg_slope(&values, period)[5], 2.0);
        assert_close(linearreg_intercept(&values, period)[5], values[2]);
        assert_close(tsf(&values, period)[5], values[6]);
        assert_close(linearreg_angle(&values, period)[5], 2.0f64.atan().to_degrees());
    }

    #[test]
    fn test_var_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let v = var(&values, 8).unwrap();
        assert_eq!(v.len(), 8);
        assert_close(v[7], 4.0);
        assert!(v[6].is_nan());
        assert_close(stddev(&values, 8).unwrap()[7], 2.0);

        let rolling = stddev(&[1.0, 1.0, 3.0, 3.0], 2).unwrap();
        assert!(rolling[0].is_nan());
        assert_close(rolling[1], 0.0);
        assert_close(rolling[2], 1.0);
    }

    #[test]
    fn test_correl_and_beta() {
        let x: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        assert_close(correl(&x, &y, 5)[10], 1.0);
        let inverse: Vec<f64> = x.iter().map(|v| -v).collect();
        assert_close(correl(&x, &inverse, 5)[10], -1.0);
        // proportional series have identical returns
        let b = beta(&x, &y, 5);
        assert!(b[4].is_nan());
        assert_close(b[5], 1.0);
    }
}
