// External crates
use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

// Local modules
use crate::constants::{
    CLOSE, DESIRED_POS_CHANGE, DESIRED_POS_ROLLING, NET_POS_SIGNAL, POSITION_SIGNAL_BUCKETS,
    POS_CHANGE_SIGNAL,
};
use crate::error::{PrepError, Result, Stage};

/// Quantile bucket of the desired position change, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionSignal {
    StrongSell,
    Sell,
    Meh,
    Buy,
    StrongBuy,
}

impl PositionSignal {
    pub const ALL: [PositionSignal; POSITION_SIGNAL_BUCKETS] = [
        PositionSignal::StrongSell,
        PositionSignal::Sell,
        PositionSignal::Meh,
        PositionSignal::Buy,
        PositionSignal::StrongBuy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSignal::StrongSell => "strong sell",
            PositionSignal::Sell => "sell",
            PositionSignal::Meh => "meh",
            PositionSignal::Buy => "buy",
            PositionSignal::StrongBuy => "strong buy",
        }
    }
}

impl fmt::Display for PositionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the rolling desired position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetPosition {
    LongHold,
    ShortHold,
}

impl NetPosition {
    pub const ALL: [NetPosition; 2] = [NetPosition::LongHold, NetPosition::ShortHold];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetPosition::LongHold => "long hold",
            NetPosition::ShortHold => "short hold",
        }
    }
}

impl fmt::Display for NetPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Enum` dtype of `pos_change_signal`, categories ordered from strong sell
/// to strong buy
pub fn position_signal_dtype() -> DataType {
    create_enum_dtype(ArrayFromIter::arr_from_iter(
        PositionSignal::ALL.iter().map(|s| s.as_str()),
    ))
}

/// `Enum` dtype of `net_pos_signal`
pub fn net_position_dtype() -> DataType {
    create_enum_dtype(ArrayFromIter::arr_from_iter(
        NetPosition::ALL.iter().map(|s| s.as_str()),
    ))
}

/// Label columns for the rows that survive the forward-return drop
#[derive(Debug, Clone)]
pub struct DesiredPosition {
    /// One flag per input row; `false` where the forward return is undefined
    pub kept: BooleanChunked,
    /// Truncated scaled z-score, before differencing
    pub change_raw: Series,
    pub change: Series,
    pub rolling: Series,
    pub pos_change_signal: Series,
    pub net_pos_signal: Series,
}

/// `ln(close[i + lag] / close[i])`, null where it is not a finite number
pub fn forward_log_returns(close: &Series, lag: usize) -> Result<Series> {
    let close = close.cast(&DataType::Float64)?;
    let ahead = close.shift(-(lag as i64));
    let ratio = (&ahead / &close)?;
    let returns: Float64Chunked = ratio
        .f64()?
        .into_iter()
        .map(|r| r.map(f64::ln).filter(|r| r.is_finite()))
        .collect();
    Ok(returns.with_name(close.name().clone()).into_series())
}

/// Z-score with population mean and standard deviation fitted on the
/// non-null values. Nulls stay null.
///
/// The fit uses the whole series, so the result looks ahead in time and is
/// only meant for offline label construction. A vanishing scale is
/// replaced by 1, which maps a constant series to zeros.
pub fn standardize(values: &Series) -> Result<Series> {
    let values = values.cast(&DataType::Float64)?;
    let ca = values.f64()?;
    let Some(mean) = ca.mean() else {
        return Ok(values);
    };
    let scale = ca
        .std(0)
        .filter(|s| *s >= 10.0 * f64::EPSILON)
        .unwrap_or(1.0);
    Ok(&(&values - mean) / scale)
}

/// Equal-frequency bin edges: `buckets + 1` linear quantiles from 0 to 1.
///
/// Fails when there are fewer values than buckets or when two edges
/// coincide; categories are never merged silently.
pub fn quantile_edges(values: &Series, buckets: usize) -> Result<Vec<f64>> {
    let values = values.cast(&DataType::Float64)?;
    let ca = values.f64()?;
    let count = ca.len() - ca.null_count();
    if count < buckets {
        return Err(PrepError::insufficient_data(
            Stage::LabelGenerator,
            format!("cannot form {} quantile bins from {} values", buckets, count),
        ));
    }
    let mut edges = Vec::with_capacity(buckets + 1);
    for k in 0..=buckets {
        let edge = ca.quantile(k as f64 / buckets as f64, QuantileMethod::Linear)?;
        edges.push(edge.unwrap_or(f64::NAN));
    }
    if edges.windows(2).any(|w| w[1] <= w[0] || w[1].is_nan()) {
        return Err(PrepError::insufficient_data(
            Stage::LabelGenerator,
            format!(
                "cannot form {} quantile bins: bin edges {:?} are not unique",
                buckets, edges
            ),
        ));
    }
    Ok(edges)
}

/// Cuts values into the five position signals with right-closed quantile
/// bins. A value sitting exactly on an inner edge goes to the lower bucket.
///
/// The full edge set (minimum and maximum included) must be strictly
/// increasing; `qcut` only sees the inner edges.
pub fn quantile_cut(values: &Series) -> Result<Series> {
    let edges = quantile_edges(values, POSITION_SIGNAL_BUCKETS)?;
    debug!("label generator: quantile edges {:?}", edges);

    let probs: Vec<f64> = (1..POSITION_SIGNAL_BUCKETS)
        .map(|k| k as f64 / POSITION_SIGNAL_BUCKETS as f64)
        .collect();
    let labels: Vec<PlSmallStr> = PositionSignal::ALL
        .iter()
        .map(|s| PlSmallStr::from_static(s.as_str()))
        .collect();
    let buckets = qcut(values, probs, Some(labels), false, false, false)?;
    Ok(buckets
        .cast(&DataType::String)?
        .cast(&position_signal_dtype())?
        .with_name(POS_CHANGE_SIGNAL.into()))
}

/// `long hold` where the rolling position is positive, `short hold` otherwise
fn net_positions(rolling: &Series) -> Result<Series> {
    let frame = DataFrame::new(vec![rolling
        .clone()
        .with_name(DESIRED_POS_ROLLING.into())
        .into_column()])?;
    let out = frame
        .lazy()
        .select([when(col(DESIRED_POS_ROLLING).gt(lit(0)))
            .then(lit(NetPosition::LongHold.as_str()))
            .otherwise(lit(NetPosition::ShortHold.as_str()))
            .cast(net_position_dtype())
            .alias(NET_POS_SIGNAL)])
        .collect()?;
    Ok(out.column(NET_POS_SIGNAL)?.as_materialized_series().clone())
}

/// Builds the desired position labels from a close price series.
///
/// # Arguments
///
/// * `close` - Close prices, oldest first
/// * `lag` - Forward horizon, rolling window and differencing distance
/// * `multiplier` - Scale applied to the z-score before truncation
///
/// # Returns
///
/// The kept-row mask and the label columns for the kept rows
pub fn desired_position(close: &Series, lag: usize, multiplier: i64) -> Result<DesiredPosition> {
    if lag == 0 {
        return Err(PrepError::InvalidConfiguration(
            "`lag` must be a positive integer".into(),
        ));
    }

    let returns = forward_log_returns(close, lag)?;
    let kept = returns.is_not_null();
    let z = standardize(&returns.filter(&kept)?)?;
    let n = z.len();
    debug!(
        "label generator: {} of {} rows have a defined forward return",
        n,
        close.len()
    );
    if n < lag + 1 {
        return Err(PrepError::insufficient_data(
            Stage::LabelGenerator,
            format!("{} rows left after dropping undefined returns, need at least {}", n, lag + 1),
        ));
    }

    // float to int cast truncates toward zero
    let change_raw = (&z * multiplier as f64)
        .cast(&DataType::Int64)?
        .with_name(DESIRED_POS_CHANGE.into());

    let rolling = change_raw
        .rolling_sum(RollingOptionsFixedWindow {
            window_size: lag,
            min_periods: 1,
            ..Default::default()
        })?
        .with_name(DESIRED_POS_ROLLING.into());

    let lagged = change_raw
        .shift(lag as i64)
        .fill_null(FillNullStrategy::Zero)?;
    let change = (&change_raw - &lagged)?.with_name(DESIRED_POS_CHANGE.into());

    let pos_change_signal = quantile_cut(&change)?;
    let net_pos_signal = net_positions(&rolling)?;

    Ok(DesiredPosition {
        kept,
        change_raw,
        change,
        rolling,
        pos_change_signal,
        net_pos_signal,
    })
}

/// Adds the desired position label bundle to a normalized frame.
///
/// Rows whose forward return is undefined (the last `lag` rows, plus rows
/// with a missing or non-positive close) are removed. The input frame is
/// left untouched.
///
/// # Arguments
///
/// * `df` - Frame with at least a `close` column
/// * `lag` - Forward horizon of the label
/// * `multiplier` - Scale of the discretized signal
///
/// # Returns
///
/// The surviving rows with `desired_pos_change`, `desired_pos_rolling`,
/// `pos_change_signal` and `net_pos_signal` appended
pub fn prepare_desired_pos(df: &DataFrame, lag: usize, multiplier: i64) -> Result<DataFrame> {
    info!(
        "label generator: building desired position (lag={}, multiplier={})",
        lag, multiplier
    );
    let close = df
        .column(CLOSE)
        .map_err(|_| PrepError::missing_column(Stage::LabelGenerator, CLOSE))?
        .as_materialized_series();
    let labels = desired_position(close, lag, multiplier)?;

    let mut out = df.filter(&labels.kept)?;
    out.with_column(labels.change)?;
    out.with_column(labels.rolling)?;
    out.with_column(labels.pos_change_signal)?;
    out.with_column(labels.net_pos_signal)?;

    info!(
        "label generator: {} rows labeled ({} dropped)",
        out.height(),
        df.height() - out.height()
    );
    Ok(out)
}

fn signal_runs(df: &DataFrame) -> Result<Vec<(String, u32)>> {
    let column = df
        .column(POS_CHANGE_SIGNAL)
        .map_err(|_| PrepError::missing_column(Stage::LabelGenerator, POS_CHANGE_SIGNAL))?;
    let values = column.as_materialized_series().cast(&DataType::String)?;
    let mut runs: Vec<(String, u32)> = Vec::new();
    for value in values.str()?.into_iter() {
        let value = value.unwrap_or_default();
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value.to_string(), 1)),
        }
    }
    Ok(runs)
}

/// Run-length encoding of `pos_change_signal`: one row per run of equal
/// consecutive values, columns `value` and `count`
pub fn run_lengths(df: &DataFrame) -> Result<DataFrame> {
    let runs = signal_runs(df)?;
    let (values, counts): (Vec<String>, Vec<u32>) = runs.into_iter().unzip();
    Ok(DataFrame::new(vec![
        Series::new("value".into(), values).into_column(),
        Series::new("count".into(), counts).into_column(),
    ])?)
}

/// Average run length per signal value, sorted by value
pub fn mean_run_length(df: &DataFrame) -> Result<DataFrame> {
    let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for (value, count) in signal_runs(df)? {
        let entry = totals.entry(value).or_insert((0, 0));
        entry.0 += count as u64;
        entry.1 += 1;
    }
    let values: Vec<String> = totals.keys().cloned().collect();
    let means: Vec<f64> = totals
        .values()
        .map(|(sum, runs)| *sum as f64 / *runs as f64)
        .collect();
    Ok(DataFrame::new(vec![
        Series::new("value".into(), values).into_column(),
        Series::new("mean_run_length".into(), means).into_column(),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_names(s: &Series) -> Vec<String> {
        s.cast(&DataType::String)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_quantile_edges_interpolate() {
        let values = Series::new("v".into(), (1..=10).map(|v| v as f64).collect::<Vec<_>>());
        let edges = quantile_edges(&values, 5).unwrap();
        let expected = [1.0, 2.8, 4.6, 6.4, 8.2, 10.0];
        for (e, x) in edges.iter().zip(expected.iter()) {
            assert!((e - x).abs() < 1e-12, "{:?}", edges);
        }
        assert_eq!(
            signal_names(&quantile_cut(&values).unwrap()),
            vec![
                "strong sell", "strong sell", "sell", "sell", "meh", "meh", "buy", "buy",
                "strong buy", "strong buy"
            ]
        );
    }

    #[test]
    fn test_value_on_inner_edge_goes_to_lower_bucket() {
        let values = Series::new("v".into(), [1i64, 2, 3, 4, 5, 6]);
        let edges = quantile_edges(&values, 5).unwrap();
        assert_eq!(edges, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            signal_names(&quantile_cut(&values).unwrap()),
            vec!["strong sell", "strong sell", "sell", "meh", "buy", "strong buy"]
        );
    }

    #[test]
    fn test_cut_has_enum_dtype_in_signal_order() {
        let values = Series::new("v".into(), [6i64, 1, 4, 2, 5, 3]);
        let cut = quantile_cut(&values).unwrap();
        assert!(matches!(cut.dtype(), DataType::Enum(_, _)));
        assert_eq!(cut.name().as_str(), POS_CHANGE_SIGNAL);
        assert_eq!(
            signal_names(&cut),
            vec!["strong buy", "strong sell", "meh", "strong sell", "buy", "sell"]
        );
    }

    #[test]
    fn test_duplicate_edges_rejected() {
        let values = Series::new("v".into(), [1.0, 1.0, 1.0, 1.0, 1.0, 2.0]);
        let err = quantile_cut(&values).unwrap_err();
        match err {
            PrepError::InsufficientData { stage, reason } => {
                assert_eq!(stage, Stage::LabelGenerator);
                assert!(reason.contains("not unique"), "{}", reason);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }

        // inner edges distinct, lowest edge equal to the first inner edge
        let values = Series::new("v".into(), [0.0, 0.0, 0.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert!(quantile_cut(&values).is_err());

        let short = Series::new("v".into(), [1.0, 2.0, 3.0]);
        assert!(quantile_edges(&short, 5).is_err());
    }

    #[test]
    fn test_standardize_population_stats() {
        let z = standardize(&Series::new("v".into(), [Some(1.0), None, Some(3.0)])).unwrap();
        let z = z.f64().unwrap();
        assert!((z.get(0).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(z.get(1), None);
        assert!((z.get(2).unwrap() - 1.0).abs() < 1e-12);

        let flat = standardize(&Series::new("v".into(), [5.0, 5.0, 5.0])).unwrap();
        assert!(flat.f64().unwrap().into_no_null_iter().all(|v| v == 0.0));
    }

    #[test]
    fn test_forward_returns_mark_undefined_rows() {
        let r = forward_log_returns(&Series::new("close".into(), [1.0, 0.0, 2.0, 4.0]), 1).unwrap();
        let r = r.f64().unwrap();
        assert_eq!(r.get(0), None);
        assert_eq!(r.get(1), None);
        assert!((r.get(2).unwrap() - 2f64.ln()).abs() < 1e-12);
        assert_eq!(r.get(3), None);
    }

    #[test]
    fn test_net_positions_split_on_zero() {
        let rolling = Series::new("r".into(), [-2i64, 0, 3]);
        let net = net_positions(&rolling).unwrap();
        assert!(matches!(net.dtype(), DataType::Enum(_, _)));
        assert_eq!(signal_names(&net), vec!["short hold", "short hold", "long hold"]);
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(PositionSignal::StrongBuy.to_string(), "strong buy");
        assert_eq!(NetPosition::ShortHold.to_string(), "short hold");
        assert_eq!(NetPosition::LongHold.as_str(), "long hold");
    }
}
