//! Momentum and trend-strength oscillators.

use polars::prelude::PolarsResult;
use rustalib::indicators::oscillators::{calculate_macd, calculate_rsi};

use super::overlap::sma;
use super::volatility::trange;
use super::{
    frame_indicator, highest, lowest, mask_warmup, on_finite_tail, ratio_or_zero,
    wilder_average, VALUE,
};

/// Rate of change in percent: `(x[i] / x[i - period] - 1) * 100`
pub fn roc(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in period..n {
        let prev = values[i - period];
        out[i] = if prev == 0.0 {
            0.0
        } else {
            (values[i] / prev - 1.0) * 100.0
        };
    }
    out
}

/// Momentum: `x[i] - x[i - period]`
pub fn mom(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in period..n {
        out[i] = values[i] - values[i - period];
    }
    out
}

/// Raw one-bar directional movement `(+DM, -DM)`; index 0 holds zeros
fn directional_movement(high: &[f64], low: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = high.len();
    let mut plus = vec![0.0; n];
    let mut minus = vec![0.0; n];
    for i in 1..n {
        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];
        if up > 0.0 && up > down {
            plus[i] = up;
        } else if down > 0.0 && down > up {
            minus[i] = down;
        }
    }
    (plus, minus)
}

/// Wilder running sum: seeded with the sum of bars `1..period`, then
/// `acc = acc - acc / period + x`. Defined from index `period - 1`.
fn wilder_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    let p = period as f64;
    let mut acc: f64 = values[1..period].iter().sum();
    out[period - 1] = acc;
    for i in period..n {
        acc = acc - acc / p + values[i];
        out[i] = acc;
    }
    out
}

/// Smoothed plus directional movement; first value at index `period - 1`
pub fn plus_dm(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
    let (plus, _) = directional_movement(high, low);
    wilder_sum(&plus, period)
}

/// Smoothed minus directional movement; first value at index `period - 1`
pub fn minus_dm(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
    let (_, minus) = directional_movement(high, low);
    wilder_sum(&minus, period)
}

/// Directional movement index; first value at index `period`
pub fn dx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let (plus, minus) = directional_movement(high, low);
    let mut tr = trange(high, low, close);
    if let Some(first) = tr.first_mut() {
        *first = 0.0;
    }
    let plus = wilder_sum(&plus, period);
    let minus = wilder_sum(&minus, period);
    let tr = wilder_sum(&tr, period);

    let out = (0..close.len())
        .map(|i| {
            let plus_di = 100.0 * ratio_or_zero(plus[i], tr[i]);
            let minus_di = 100.0 * ratio_or_zero(minus[i], tr[i]);
            100.0 * ratio_or_zero((plus_di - minus_di).abs(), plus_di + minus_di)
        })
        .collect();
    // NaN sums already propagate; the seed bar itself is not reported
    mask_warmup(out, period)
}

/// Average directional movement index; first value at index `2 * period - 1`
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let dx = dx(high, low, close, period);
    on_finite_tail(&dx, |tail| wilder_average(tail, period))
}

/// ADX rating: mean of today's ADX and the ADX `period - 1` bars ago
pub fn adxr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let adx = adx(high, low, close, period);
    let shift = period.saturating_sub(1);
    (0..adx.len())
        .map(|i| {
            if i < shift {
                f64::NAN
            } else {
                (adx[i] + adx[i - shift]) / 2.0
            }
        })
        .collect()
}

/// Absolute price oscillator with simple moving averages
pub fn apo(values: &[f64], fast_period: usize, slow_period: usize) -> PolarsResult<Vec<f64>> {
    let fast = sma(values, fast_period)?;
    let slow = sma(values, slow_period)?;
    Ok(fast.iter().zip(&slow).map(|(f, s)| f - s).collect())
}

/// Percentage price oscillator with simple moving averages
pub fn ppo(values: &[f64], fast_period: usize, slow_period: usize) -> PolarsResult<Vec<f64>> {
    let fast = sma(values, fast_period)?;
    let slow = sma(values, slow_period)?;
    Ok(fast
        .iter()
        .zip(&slow)
        .map(|(&f, &s)| {
            if f.is_nan() || s.is_nan() {
                f64::NAN
            } else {
                100.0 * ratio_or_zero(f - s, s)
            }
        })
        .collect())
}

/// Aroon oscillator (`aroon up - aroon down`) over `period + 1` bars
pub fn aroonosc(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
    let n = high.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 {
        return out;
    }
    let p = period as f64;
    for i in period..n {
        let start = i - period;
        let mut high_idx = start;
        let mut low_idx = start;
        for j in start..=i {
            // ties resolve to the most recent bar
            if high[j] >= high[high_idx] {
                high_idx = j;
            }
            if low[j] <= low[low_idx] {
                low_idx = j;
            }
        }
        let up = 100.0 * (p - (i - high_idx) as f64) / p;
        let down = 100.0 * (p - (i - low_idx) as f64) / p;
        out[i] = up - down;
    }
    out
}

/// Commodity channel index; first value at index `period - 1`
pub fn cci(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    let typical: Vec<f64> = (0..n).map(|i| (high[i] + low[i] + close[i]) / 3.0).collect();
    let p = period as f64;
    for i in period - 1..n {
        let window = &typical[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / p;
        let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / p;
        out[i] = ratio_or_zero(typical[i] - mean, 0.015 * mean_dev);
    }
    out
}

/// Wilder-smoothed average gains and losses of one-bar changes; both are
/// defined from index `period`
fn average_gain_loss(values: &[f64], period: usize) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let change = values[i] - values[i - 1];
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }
    (
        on_finite_tail(&gains, |tail| wilder_average(tail, period)),
        on_finite_tail(&losses, |tail| wilder_average(tail, period)),
    )
}

/// Relative strength index; first value at index `period`
pub fn rsi(values: &[f64], period: usize) -> PolarsResult<Vec<f64>> {
    frame_indicator(&[(VALUE, values)], period, |df| {
        calculate_rsi(df, period, VALUE)
    })
}

/// Chande momentum oscillator; first value at index `period`
pub fn cmo(values: &[f64], period: usize) -> Vec<f64> {
    let (gain, loss) = average_gain_loss(values, period);
    gain.iter()
        .zip(&loss)
        .map(|(&g, &l)| {
            if g.is_nan() {
                f64::NAN
            } else {
                100.0 * ratio_or_zero(g - l, g + l)
            }
        })
        .collect()
}

/// Raw stochastic %K; first value at index `period - 1`
fn fast_k(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    for i in period - 1..n {
        let hh = highest(high, i, period);
        let ll = lowest(low, i, period);
        out[i] = 100.0 * ratio_or_zero(close[i] - ll, hh - ll);
    }
    out
}

/// Slow stochastic %K (SMA smoothed).
///
/// The output starts where the slow %D would start, so %K and %D of the
/// same call share their first row.
pub fn stoch_slowk(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    fastk_period: usize,
    slowk_period: usize,
    slowd_period: usize,
) -> PolarsResult<Vec<f64>> {
    let fastk = fast_k(high, low, close, fastk_period);
    let slowk = sma(&fastk, slowk_period)?;
    let lookback = (fastk_period + slowk_period + slowd_period).saturating_sub(3);
    Ok(mask_warmup(slowk, lookback))
}

/// Fast stochastic %K, aligned with its %D line
pub fn stochf_fastk(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    fastk_period: usize,
    fastd_period: usize,
) -> Vec<f64> {
    let fastk = fast_k(high, low, close, fastk_period);
    let lookback = (fastk_period + fastd_period).saturating_sub(2);
    mask_warmup(fastk, lookback)
}

/// Stochastic RSI %K: fast stochastic applied to the RSI series
pub fn stochrsi_k(
    values: &[f64],
    period: usize,
    fastk_period: usize,
    fastd_period: usize,
) -> PolarsResult<Vec<f64>> {
    let rsi = rsi(values, period)?;
    let fastk = on_finite_tail(&rsi, |tail| fast_k(tail, tail, tail, fastk_period));
    let lookback = period + (fastk_period + fastd_period).saturating_sub(2);
    Ok(mask_warmup(fastk, lookback))
}

/// MACD signal line over EMA(fast) - EMA(slow); the periods are swapped
/// when `slow_period < fast_period`
pub fn macd_signal(
    values: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> PolarsResult<Vec<f64>> {
    let (fast_period, slow_period) = if slow_period < fast_period {
        (slow_period, fast_period)
    } else {
        (fast_period, slow_period)
    };
    let lookback = (slow_period + signal_period).saturating_sub(2);
    frame_indicator(&[(VALUE, values)], lookback, |df| {
        let (_, signal) = calculate_macd(df, fast_period, slow_period, signal_period, VALUE)?;
        Ok(signal)
    })
}

/// MACD signal line with the fixed 12/26 averages
pub fn macdfix_signal(values: &[f64], signal_period: usize) -> PolarsResult<Vec<f64>> {
    macd_signal(values, 12, 26, signal_period)
}

/// Ultimate oscillator over three buying-pressure windows
pub fn ultosc(high: &[f64], low: &[f64], close: &[f64], period1: usize, period2: usize, period3: usize) -> Vec<f64> {
    let n = close.len();
    let mut periods = [period1, period2, period3];
    periods.sort_unstable();
    let [short, medium, long] = periods;
    let mut out = vec![f64::NAN; n];
    if short == 0 || n <= long {
        return out;
    }

    let mut pressure = vec![0.0; n];
    let mut range = vec![0.0; n];
    for i in 1..n {
        let true_low = low[i].min(close[i - 1]);
        pressure[i] = close[i] - true_low;
        range[i] = high[i].max(close[i - 1]) - true_low;
    }

    let average = |i: usize, p: usize| {
        let bp: f64 = pressure[i + 1 - p..=i].iter().sum();
        let tr: f64 = range[i + 1 - p..=i].iter().sum();
        ratio_or_zero(bp, tr)
    };
    for i in long..n {
        out[i] = 100.0 * (4.0 * average(i, short) + 2.0 * average(i, medium) + average(i, long)) / 7.0;
    }
    out
}

/// Williams %R; first value at index `period - 1`
pub fn willr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    for i in period - 1..n {
        let hh = highest(high, i, period);
        let ll = lowest(low, i, period);
        out[i] = -100.0 * ratio_or_zero(hh - close[i], hh - ll);
    }
    out
}
