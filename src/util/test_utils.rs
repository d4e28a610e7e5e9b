// External crates
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

// Local modules
use crate::error::{PrepError, Result};

/// Generates a deterministic vendor-format OHLCV frame for tests.
///
/// One-minute bars starting Monday 2023-01-02 09:30:00. Prices follow a
/// slow upward drift with a 40-bar oscillation and seeded noise, so the
/// label buckets and every indicator have something to work with.
///
/// # Arguments
///
/// * `num_rows` - Number of bars
/// * `seed` - Seed of the `StdRng`
///
/// # Returns
///
/// A frame with the vendor columns `exchange`, `symbol`, `turnover`,
/// `open_price`, `high_price`, `low_price`, `close_price`, `volume`,
/// `open_interest` and a string `datetime` column
pub fn generate_vendor_dataframe(num_rows: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = StdRng::seed_from_u64(seed);

    let start = NaiveDate::from_ymd_opt(2023, 1, 2)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .ok_or_else(|| PrepError::InvalidConfiguration("invalid start timestamp".into()))?;
    let times: Vec<String> = (0..num_rows)
        .map(|i| {
            (start + Duration::minutes(i as i64))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .collect();

    let mut open_prices = Vec::with_capacity(num_rows);
    let mut high_prices = Vec::with_capacity(num_rows);
    let mut low_prices = Vec::with_capacity(num_rows);
    let mut close_prices = Vec::with_capacity(num_rows);
    let mut volume = Vec::with_capacity(num_rows);
    let mut open_interest = Vec::with_capacity(num_rows);
    let mut turnover = Vec::with_capacity(num_rows);

    let mut previous_close: f64 = 100.0;
    for t in 0..num_rows {
        let trend = 100.0 * (0.0005 * t as f64).exp();
        let cycle = 3.0 * (2.0 * PI * t as f64 / 40.0).sin();
        let noise = rng.random_range(-0.6..0.6);
        let close: f64 = trend + cycle + noise;

        let open: f64 = previous_close + rng.random_range(-0.3..0.3);
        let high = open.max(close) + rng.random_range(0.05..0.5);
        let low = open.min(close) - rng.random_range(0.05..0.5);
        let vol = rng.random_range(1_000..5_000) as i64;

        open_prices.push(open);
        high_prices.push(high);
        low_prices.push(low);
        close_prices.push(close);
        volume.push(vol);
        open_interest.push(50_000 + rng.random_range(-500..500) as i64);
        turnover.push(close * vol as f64);
        previous_close = close;
    }

    let df = DataFrame::new(vec![
        Series::new("exchange".into(), vec!["SHFE"; num_rows]).into_column(),
        Series::new("symbol".into(), vec!["rb2305"; num_rows]).into_column(),
        Series::new("turnover".into(), turnover).into_column(),
        Series::new("open_price".into(), open_prices).into_column(),
        Series::new("high_price".into(), high_prices).into_column(),
        Series::new("low_price".into(), low_prices).into_column(),
        Series::new("close_price".into(), close_prices).into_column(),
        Series::new("volume".into(), volume).into_column(),
        Series::new("open_interest".into(), open_interest).into_column(),
        Series::new("datetime".into(), times).into_column(),
    ])?;

    Ok(df)
}

/// Canonical OHLCV frame (already normalized) built from close prices
pub fn ohlcv_from_closes(closes: &[f64]) -> Result<DataFrame> {
    let n = closes.len();
    let open: Vec<f64> = closes.to_vec();
    let high: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
    let low: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
    let df = DataFrame::new(vec![
        Series::new("open".into(), open).into_column(),
        Series::new("high".into(), high).into_column(),
        Series::new("low".into(), low).into_column(),
        Series::new("close".into(), closes.to_vec()).into_column(),
        Series::new("volume".into(), vec![1_000i64; n]).into_column(),
        Series::new("open_interest".into(), vec![10_000i64; n]).into_column(),
    ])?;
    Ok(df)
}
