// External imports
use anyhow::Result;
use polars::prelude::*;
use std::collections::HashSet;

// Internal imports
use crate::config::PipelineConfig;
use crate::constants::{OHLCV_COLUMNS, TARGET_COLUMNS};
use crate::error::{PrepError, Stage};
use crate::pipeline::{drop_ohlcv_cols, prep_data, split_features_target};
use crate::util::test_utils::{generate_vendor_dataframe, ohlcv_from_closes};

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_end_to_end_on_drifting_series() -> Result<()> {
    let raw = generate_vendor_dataframe(1000, 42)?;
    let config = PipelineConfig::new(vec![5, 10], 10, 100);
    let (x, y) = prep_data(&raw, &config)?;

    // 1000 - lag rows get labels, then the pattern smoothing warmup goes
    assert_eq!(x.height(), y.height());
    assert!(x.height() > 600 && x.height() <= 990 - 313, "{} rows", x.height());

    assert_eq!(column_names(&y), TARGET_COLUMNS.to_vec());
    let x_names = column_names(&x);
    for raw_name in OHLCV_COLUMNS {
        assert!(!x_names.iter().any(|n| n == raw_name), "{} leaked into X", raw_name);
    }
    let y_names: HashSet<String> = column_names(&y).into_iter().collect();
    assert!(x_names.iter().all(|n| !y_names.contains(n)));

    let mut sorted = x_names.clone();
    sorted.sort();
    assert_eq!(x_names, sorted);
    assert!(x.get_columns().iter().all(|c| c.null_count() == 0));
    assert!(y.get_columns().iter().all(|c| c.null_count() == 0));
    Ok(())
}

#[test]
fn test_prep_data_is_deterministic() -> Result<()> {
    let raw = generate_vendor_dataframe(400, 3)?;
    let config = PipelineConfig::new(vec![4, 8], 6, 50).with_pattern_smoothing_window(30);
    let (x1, y1) = prep_data(&raw, &config)?;
    let (x2, y2) = prep_data(&raw, &config)?;
    assert!(x1.equals_missing(&x2));
    assert!(y1.equals_missing(&y2));
    Ok(())
}

#[test]
fn test_signals_partition_rows() -> Result<()> {
    let raw = generate_vendor_dataframe(600, 9)?;
    let config = PipelineConfig::new(vec![5], 10, 100).with_pattern_smoothing_window(20);
    let (_, y) = prep_data(&raw, &config)?;

    let signals = y
        .column("pos_change_signal")?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let signals = signals.str()?;
    let allowed = ["strong sell", "sell", "meh", "buy", "strong buy"];
    assert!(signals.into_no_null_iter().all(|s| allowed.contains(&s)));

    let rolling = y.column("desired_pos_rolling")?.as_materialized_series().i64()?;
    let net = y
        .column("net_pos_signal")?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let net = net.str()?;
    for (r, n) in rolling.into_no_null_iter().zip(net.into_no_null_iter()) {
        assert_eq!(n == "long hold", r > 0);
    }
    Ok(())
}

#[test]
fn test_invalid_configuration_rejected_before_data() -> Result<()> {
    let empty = DataFrame::default();
    for config in [
        PipelineConfig::new(vec![], 10, 100),
        PipelineConfig::new(vec![1, 5], 10, 100),
        PipelineConfig::new(vec![5], 0, 100),
    ] {
        assert!(matches!(
            prep_data(&empty, &config),
            Err(PrepError::InvalidConfiguration(_))
        ));
    }
    Ok(())
}

#[test]
fn test_constant_growth_fails_end_to_end() -> Result<()> {
    let n = 500;
    let closes: Vec<f64> = (0..n).map(|i| 100.0 * 1.001f64.powi(i as i32)).collect();
    let raw = DataFrame::new(vec![
        Series::new("open_price".into(), closes.clone()).into_column(),
        Series::new("high_price".into(), closes.iter().map(|c| c + 0.1).collect::<Vec<f64>>())
            .into_column(),
        Series::new("low_price".into(), closes.iter().map(|c| c - 0.1).collect::<Vec<f64>>())
            .into_column(),
        Series::new("close_price".into(), closes).into_column(),
        Series::new("volume".into(), vec![100i64; n]).into_column(),
        Series::new("open_interest".into(), vec![10i64; n]).into_column(),
    ])?;
    match prep_data(&raw, &PipelineConfig::new(vec![5], 5, 100)) {
        Err(PrepError::InsufficientData { stage, .. }) => assert_eq!(stage, Stage::LabelGenerator),
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_drop_ohlcv_cols() -> Result<()> {
    let df = ohlcv_from_closes(&[1.0, 2.0, 3.0])?;
    let extra = Series::new("feature".into(), vec![0.5, 0.6, 0.7]);
    let mut with_feature = df.clone();
    with_feature.with_column(extra)?;

    let trimmed = drop_ohlcv_cols(&with_feature)?;
    assert_eq!(column_names(&trimmed), vec!["feature".to_string()]);

    match drop_ohlcv_cols(&df.drop("open_interest")?) {
        Err(PrepError::MissingColumn { stage, column }) => {
            assert_eq!(stage, Stage::Splitter);
            assert_eq!(column, "open_interest");
        }
        other => panic!("expected MissingColumn, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_split_features_target_order() -> Result<()> {
    let df = DataFrame::new(vec![
        Series::new("desired_pos_rolling".into(), vec![1i64, -2]).into_column(),
        Series::new("b_feature".into(), vec![1.0, 2.0]).into_column(),
        Series::new("net_pos_signal".into(), vec!["long hold", "short hold"]).into_column(),
        Series::new("desired_pos_change".into(), vec![3i64, 4]).into_column(),
        Series::new("a_feature".into(), vec![3.0, 4.0]).into_column(),
        Series::new("pos_change_signal".into(), vec!["buy", "sell"]).into_column(),
    ])?;
    let (x, y) = split_features_target(&df)?;
    assert_eq!(column_names(&x), vec!["b_feature".to_string(), "a_feature".to_string()]);
    assert_eq!(column_names(&y), TARGET_COLUMNS.to_vec());
    assert_eq!(x.height(), y.height());

    assert!(split_features_target(&df.drop("net_pos_signal")?).is_err());
    Ok(())
}
