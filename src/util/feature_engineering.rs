// External crates
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use polars::prelude::*;

// Local modules
use crate::config::PipelineConfig;
use crate::constants::{CLOSE, DATETIME_COLUMN, HIGH, LOW, OPEN, VOLUME};
use crate::error::{PrepError, Result, Stage};
use crate::indicators::pattern::{Candles, CANDLE_PATTERNS};
use crate::indicators::{cycle, momentum, overlap, statistic, volatility, volume};

/// String layouts accepted for the `datetime` column
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Reads a numeric column as `f64`, nulls become `NaN`
fn column_as_f64(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PrepError::missing_column(stage, name))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Price and volume columns of a normalized frame as plain vectors
#[derive(Debug, Clone)]
pub struct Ohlcv {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Ohlcv {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let get = |name: &str| column_as_f64(df, name, Stage::FeatureGenerator);
        Ok(Self {
            open: get(OPEN)?,
            high: get(HIGH)?,
            low: get(LOW)?,
            close: get(CLOSE)?,
            volume: get(VOLUME)?,
        })
    }

    pub fn candles(&self) -> Candles<'_> {
        Candles::new(&self.open, &self.high, &self.low, &self.close)
    }
}

/// Named feature columns collected before they are attached to a frame
#[derive(Default)]
struct FeatureSet {
    series: Vec<Series>,
}

impl FeatureSet {
    /// Stores `values` under `name`; `NaN` and infinities become nulls
    fn push(&mut self, name: String, values: Vec<f64>) {
        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| if v.is_finite() { Some(v) } else { None })
            .collect();
        self.series.push(Series::new(name.into(), values));
    }

    fn attach(self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for series in self.series {
            out.with_column(series)?;
        }
        Ok(out)
    }
}

/// Adds the volume family for every lag: `ADOSC_{l}` (fast `l`, slow
/// `3l`) and `MFI_{l}`
pub fn generate_volume_features(df: &DataFrame, lags: &[usize]) -> Result<DataFrame> {
    let p = Ohlcv::from_frame(df)?;
    let mut features = FeatureSet::default();
    for &lag in lags {
        features.push(
            format!("ADOSC_{}", lag),
            volume::adosc(&p.high, &p.low, &p.close, &p.volume, lag, 3 * lag)?,
        );
        features.push(
            format!("MFI_{}", lag),
            volume::mfi(&p.high, &p.low, &p.close, &p.volume, lag),
        );
    }
    debug!("volume features: {} columns", features.series.len());
    features.attach(df)
}

/// Adds the momentum and volatility family for every lag.
///
/// Multi-window indicators derive their other windows from the lag:
/// `2l`/`3l` for slow legs, `l / 2` for smoothing legs.
pub fn generate_momentum_features(df: &DataFrame, lags: &[usize]) -> Result<DataFrame> {
    let p = Ohlcv::from_frame(df)?;
    let (h, l, c) = (&p.high, &p.low, &p.close);
    let mut features = FeatureSet::default();
    for &lag in lags {
        let half = lag / 2;
        features.push(format!("ROC_{}", lag), momentum::roc(c, lag));
        features.push(format!("MOM_{}", lag), momentum::mom(c, lag));
        features.push(format!("PLUS_DM_{}", lag), momentum::plus_dm(h, l, lag));
        features.push(format!("MINUS_DM_{}", lag), momentum::minus_dm(h, l, lag));
        features.push(format!("ADX_{}", lag), momentum::adx(h, l, c, lag));
        features.push(format!("ADXR_{}", lag), momentum::adxr(h, l, c, lag));
        features.push(format!("APO_{}", lag), momentum::apo(c, lag, 2 * lag)?);
        features.push(format!("AROONOSC_{}", lag), momentum::aroonosc(h, l, lag));
        features.push(format!("CCI_{}", lag), momentum::cci(h, l, c, lag));
        features.push(format!("CMO_{}", lag), momentum::cmo(c, lag));
        features.push(format!("DX_{}", lag), momentum::dx(h, l, c, lag));
        features.push(
            format!("STOCH_{}slowk", lag),
            momentum::stoch_slowk(h, l, c, lag, half, half)?,
        );
        features.push(
            format!("STOCHF_{}fastk", lag),
            momentum::stochf_fastk(h, l, c, lag, half),
        );
        features.push(
            format!("MACDSIGNAL_{}", lag),
            momentum::macd_signal(c, lag, 2 * lag, half)?,
        );
        features.push(
            format!("MACDSIGNALFIX_{}", lag),
            momentum::macdfix_signal(c, lag)?,
        );
        features.push(format!("PPO_{}", lag), momentum::ppo(c, lag, 2 * lag)?);
        features.push(format!("RSI_{}", lag), momentum::rsi(c, lag)?);
        features.push(
            format!("ULTOSC_{}", lag),
            momentum::ultosc(h, l, c, lag, 2 * lag, 3 * lag),
        );
        features.push(format!("WILLR_{}", lag), momentum::willr(h, l, c, lag));
        features.push(format!("STOCHRSI_{}k", lag), momentum::stochrsi_k(c, lag, 3, 3)?);
        features.push(format!("NATR_{}", lag), volatility::natr(h, l, c, lag)?);
        features.push(format!("ATR_{}", lag), volatility::atr(h, l, c, lag)?);
        features.push(format!("TRANGE_{}", lag), volatility::trange(h, l, c));
    }
    debug!("momentum features: {} columns", features.series.len());
    features.attach(df)
}

/// Adds the statistic family for every lag; `BETA` and `CORREL` compare
/// `high` against `low`, the regression and dispersion indicators use `close`
pub fn generate_math_features(df: &DataFrame, lags: &[usize]) -> Result<DataFrame> {
    let p = Ohlcv::from_frame(df)?;
    let c = &p.close;
    let mut features = FeatureSet::default();
    for &lag in lags {
        features.push(format!("BETA_{}", lag), statistic::beta(&p.high, &p.low, lag));
        features.push(format!("CORREL_{}", lag), statistic::correl(&p.high, &p.low, lag));
        features.push(format!("LINEARREG_{}", lag), statistic::linearreg(c, lag));
        features.push(
            format!("LINEARREG_ANGLE_{}", lag),
            statistic::linearreg_angle(c, lag),
        );
        features.push(
            format!("LINEARREG_INTERCEPT_{}", lag),
            statistic::linearreg_intercept(c, lag),
        );
        features.push(
            format!("LINEARREG_SLOPE_{}", lag),
            statistic::linearreg_slope(c, lag),
        );
        features.push(format!("STDDEV_{}", lag), statistic::stddev(c, lag)?);
        features.push(format!("TSF_{}", lag), statistic::tsf(c, lag));
        features.push(format!("VAR_{}", lag), statistic::var(c, lag)?);
    }
    debug!("math features: {} columns", features.series.len());
    features.attach(df)
}

/// Adds the lag-independent Hilbert transform features of `close`
pub fn generate_cycle_features(df: &DataFrame) -> Result<DataFrame> {
    let close = column_as_f64(df, CLOSE, Stage::FeatureGenerator)?;
    let ht = cycle::hilbert_transform(&close);
    let mut features = FeatureSet::default();
    features.push("HT_TRENDLINE".to_string(), ht.trendline);
    features.push("HT_TRENDMODE".to_string(), ht.trend_mode);
    features.push("HT_DCPERIOD".to_string(), ht.dc_period);
    features.push("HT_DCPHASE".to_string(), ht.dc_phase);
    features.push("HT_PHASORinphase".to_string(), ht.inphase);
    features.push("HT_SINEsine".to_string(), ht.sine);
    features.attach(df)
}

/// Adds every candlestick pattern signal, smoothed with a weighted moving
/// average of `window` bars
pub fn generate_pattern_features(df: &DataFrame, window: usize) -> Result<DataFrame> {
    if window == 0 {
        return Err(PrepError::InvalidConfiguration(
            "pattern smoothing window must be a positive integer".into(),
        ));
    }
    let p = Ohlcv::from_frame(df)?;
    let candles = p.candles();
    let mut features = FeatureSet::default();
    for (name, recognize) in CANDLE_PATTERNS.iter() {
        features.push(name.to_string(), overlap::wma(&recognize(&candles), window));
    }
    debug!(
        "pattern features: {} columns smoothed over {} bars",
        features.series.len(),
        window
    );
    features.attach(df)
}

fn invalid_timestamp(row: usize, value: impl Into<String>) -> PrepError {
    PrepError::InvalidTimestamp {
        row,
        value: value.into(),
    }
}

fn parse_datetime_str(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn first_null(series: &Series) -> Option<usize> {
    series.is_null().into_iter().position(|v| v == Some(true))
}

/// Reads the `datetime` column as a `Datetime` series. Strings are parsed
/// with the accepted layouts; `Datetime` and `Date` columns are taken as is.
fn read_timestamps(df: &DataFrame) -> Result<Series> {
    let column = df
        .column(DATETIME_COLUMN)
        .map_err(|_| PrepError::missing_column(Stage::FeatureGenerator, DATETIME_COLUMN))?;
    let series = column.as_materialized_series();

    match series.dtype() {
        DataType::String => {
            // a null pattern strips surrounding whitespace
            let whitespace = Column::full_null("pattern".into(), 1, &DataType::Null);
            let trimmed = series.str()?.strip_chars(&whitespace)?;
            let millis = trimmed
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    let raw = v.ok_or_else(|| invalid_timestamp(row, "null"))?;
                    parse_datetime_str(raw)
                        .map(|t| t.and_utc().timestamp_millis())
                        .ok_or_else(|| invalid_timestamp(row, raw))
                })
                .collect::<Result<Vec<i64>>>()?;
            Ok(Int64Chunked::from_vec(series.name().clone(), millis)
                .into_datetime(TimeUnit::Milliseconds, None)
                .into_series())
        }
        DataType::Datetime(_, _) | DataType::Date => {
            if let Some(row) = first_null(series) {
                return Err(invalid_timestamp(row, "null"));
            }
            Ok(series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
        }
        other => Err(invalid_timestamp(0, format!("unsupported dtype {}", other))),
    }
}

fn calendar_column(name: &str, values: Int8Chunked) -> Result<Series> {
    Ok(values
        .into_series()
        .cast(&DataType::Int32)?
        .with_name(name.into()))
}

/// Adds `time_hour`, `time_minute`, `time_day_of_week` (Monday = 0) and
/// `time_day_of_month`, then drops the `datetime` column
pub fn generate_time_features(df: &DataFrame) -> Result<DataFrame> {
    let stamps = read_timestamps(df)?;

    let hour = calendar_column("time_hour", stamps.hour()?)?;
    let minute = calendar_column("time_minute", stamps.minute()?)?;
    // ISO weekday counts Monday as 1
    let day_of_week = &calendar_column("time_day_of_week", stamps.weekday()?)? - 1;
    let day_of_month = calendar_column("time_day_of_month", stamps.day()?)?;

    let mut out = df.drop(DATETIME_COLUMN)?;
    out.with_column(hour)?;
    out.with_column(minute)?;
    out.with_column(day_of_week)?;
    out.with_column(day_of_month)?;
    Ok(out)
}

/// Builds the full feature table.
///
/// Runs every family in turn, drops the rows that still hold a null
/// (indicator warmup) and sorts the columns by name.
///
/// # Arguments
///
/// * `df` - Normalized frame, usually already labeled
/// * `config` - Lags and pattern smoothing window
///
/// # Returns
///
/// The input columns plus every feature column, nulls removed
pub fn generate_all_features(df: &DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    info!(
        "feature generator: lags {:?}, pattern window {}",
        config.lags, config.pattern_smoothing_window
    );
    for required in [OPEN, HIGH, LOW, CLOSE, VOLUME, DATETIME_COLUMN] {
        if df.column(required).is_err() {
            return Err(PrepError::missing_column(Stage::FeatureGenerator, required));
        }
    }

    let out = generate_volume_features(df, &config.lags)?;
    let out = generate_momentum_features(&out, &config.lags)?;
    let out = generate_cycle_features(&out)?;
    let out = generate_math_features(&out, &config.lags)?;
    let out = generate_pattern_features(&out, config.pattern_smoothing_window)?;
    let out = generate_time_features(&out)?;

    let before = out.height();
    let out = out.drop_nulls::<String>(None)?;
    if out.height() < before {
        warn!(
            "feature generator: dropped {} of {} rows with undefined features",
            before - out.height(),
            before
        );
    }

    let mut names: Vec<String> = out
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    names.sort();
    let out = out.select(names)?;

    info!(
        "feature generator: {} rows, {} columns",
        out.height(),
        out.width()
    );
    Ok(out)
}
