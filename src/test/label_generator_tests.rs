// External imports
use anyhow::Result;
use polars::prelude::*;

// Internal imports
use crate::constants::{DESIRED_POS_CHANGE, DESIRED_POS_ROLLING, NET_POS_SIGNAL, POS_CHANGE_SIGNAL};
use crate::error::{PrepError, Stage};
use crate::util::label_generator::{
    desired_position, mean_run_length, prepare_desired_pos, run_lengths, NetPosition,
    PositionSignal,
};
use crate::util::pre_processor::keep_essentials;
use crate::util::test_utils::{generate_vendor_dataframe, ohlcv_from_closes};

// Oscillating closes with a slight drift: plenty of distinct returns
fn wavy_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 10.0 * (0.7 * i as f64).sin() + 0.05 * i as f64)
        .collect()
}

fn close_series(closes: &[f64]) -> Series {
    Series::new("close".into(), closes)
}

fn ints(s: &Series) -> Result<Vec<i64>> {
    Ok(s.i64()?.into_no_null_iter().collect())
}

fn strings(s: &Series) -> Result<Vec<String>> {
    Ok(s.cast(&DataType::String)?
        .str()?
        .into_no_null_iter()
        .map(|v| v.to_string())
        .collect())
}

#[test]
fn test_row_count_drops_last_lag_rows() -> Result<()> {
    let df = keep_essentials(&generate_vendor_dataframe(200, 7)?)?;
    let labeled = prepare_desired_pos(&df, 5, 100)?;

    assert_eq!(labeled.height(), 195);
    for name in [DESIRED_POS_CHANGE, DESIRED_POS_ROLLING, POS_CHANGE_SIGNAL, NET_POS_SIGNAL] {
        assert!(labeled.column(name).is_ok(), "Missing label column {}", name);
    }
    assert_eq!(labeled.width(), df.width() + 4);
    assert_eq!(labeled.column(DESIRED_POS_CHANGE)?.dtype(), &DataType::Int64);
    assert_eq!(labeled.column(DESIRED_POS_ROLLING)?.dtype(), &DataType::Int64);
    assert!(matches!(
        labeled.column(POS_CHANGE_SIGNAL)?.dtype(),
        DataType::Enum(_, _)
    ));
    assert!(matches!(
        labeled.column(NET_POS_SIGNAL)?.dtype(),
        DataType::Enum(_, _)
    ));

    // categories keep the bucket order, not the lexical one
    let categories = strings(
        &labeled
            .column(POS_CHANGE_SIGNAL)?
            .as_materialized_series()
            .unique()?
            .sort(SortOptions::default())?,
    )?;
    let expected: Vec<String> = PositionSignal::ALL.iter().map(|s| s.to_string()).collect();
    assert_eq!(categories, expected);
    Ok(())
}

#[test]
fn test_change_is_differenced_raw_signal() -> Result<()> {
    let lag = 3;
    let labels = desired_position(&close_series(&wavy_closes(60)), lag, 1000)?;
    let change = ints(&labels.change)?;
    let raw = ints(&labels.change_raw)?;

    assert_eq!(change.len(), 57);
    for i in 0..lag {
        assert_eq!(change[i], raw[i]);
    }
    for i in lag..change.len() {
        assert_eq!(change[i], raw[i] - raw[i - lag]);
    }
    Ok(())
}

#[test]
fn test_rolling_sum_and_net_position() -> Result<()> {
    let lag = 3;
    let labels = desired_position(&close_series(&wavy_closes(60)), lag, 1000)?;
    let rolling = ints(&labels.rolling)?;
    let raw = ints(&labels.change_raw)?;
    let net = strings(&labels.net_pos_signal)?;

    assert_eq!(rolling.len(), raw.len());
    for i in 0..rolling.len() {
        let start = i.saturating_sub(lag - 1);
        let expected: i64 = raw[start..=i].iter().sum();
        assert_eq!(rolling[i], expected);
        let position = if rolling[i] > 0 {
            NetPosition::LongHold
        } else {
            NetPosition::ShortHold
        };
        assert_eq!(net[i], position.as_str());
    }
    Ok(())
}

#[test]
fn test_five_balanced_buckets_in_order() -> Result<()> {
    let labels = desired_position(&close_series(&wavy_closes(60)), 3, 1000)?;
    let names = strings(&labels.pos_change_signal)?;
    let signals: Vec<PositionSignal> = names
        .iter()
        .map(|name| {
            PositionSignal::ALL
                .into_iter()
                .find(|s| s.as_str() == name)
                .unwrap()
        })
        .collect();

    for signal in PositionSignal::ALL {
        let count = signals.iter().filter(|s| **s == signal).count();
        assert!(count >= 10 && count <= 13, "{} has {} rows", signal, count);
    }

    // bucket order follows the value order
    let mut pairs: Vec<(i64, PositionSignal)> = ints(&labels.change)?
        .into_iter()
        .zip(signals.into_iter())
        .collect();
    pairs.sort();
    assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
    Ok(())
}

#[test]
fn test_non_positive_close_drops_its_rows() -> Result<()> {
    let mut closes = wavy_closes(60);
    closes[30] = 0.0;
    let labels = desired_position(&close_series(&closes), 3, 1000)?;

    // rows 27 (looks at the zero) and 30 (starts at the zero) plus the tail
    assert_eq!(labels.change.len(), 55);
    assert_eq!(labels.kept.get(27), Some(false));
    assert_eq!(labels.kept.get(30), Some(false));
    assert_eq!(labels.kept.get(28), Some(true));
    let dropped = labels
        .kept
        .into_iter()
        .take(57)
        .filter(|k| *k == Some(false))
        .count();
    assert_eq!(dropped, 2);
    Ok(())
}

#[test]
fn test_flat_prices_with_lag_plus_one_rows() -> Result<()> {
    let df = ohlcv_from_closes(&[100.0; 4])?;
    match prepare_desired_pos(&df, 3, 100) {
        Err(PrepError::InsufficientData { stage, .. }) => assert_eq!(stage, Stage::LabelGenerator),
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_constant_growth_cannot_be_bucketed() -> Result<()> {
    let closes: Vec<f64> = (0..100).map(|i| 100.0 * 1.001f64.powi(i)).collect();
    let df = ohlcv_from_closes(&closes)?;
    match prepare_desired_pos(&df, 5, 100) {
        Err(PrepError::InsufficientData { stage, reason }) => {
            assert_eq!(stage, Stage::LabelGenerator);
            assert!(reason.contains("quantile bins"), "{}", reason);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_missing_close_and_zero_lag() -> Result<()> {
    let df = ohlcv_from_closes(&wavy_closes(30))?.drop("close")?;
    match prepare_desired_pos(&df, 3, 100) {
        Err(PrepError::MissingColumn { stage, column }) => {
            assert_eq!(stage, Stage::LabelGenerator);
            assert_eq!(column, "close");
        }
        other => panic!("expected MissingColumn, got {:?}", other),
    }

    let df = ohlcv_from_closes(&wavy_closes(30))?;
    assert!(matches!(
        prepare_desired_pos(&df, 0, 100),
        Err(PrepError::InvalidConfiguration(_))
    ));
    Ok(())
}

#[test]
fn test_input_frame_untouched() -> Result<()> {
    let df = ohlcv_from_closes(&wavy_closes(60))?;
    let snapshot = df.clone();
    let labeled = prepare_desired_pos(&df, 3, 1000)?;
    assert!(df.equals_missing(&snapshot));
    assert_eq!(labeled.height(), 57);
    Ok(())
}

#[test]
fn test_run_lengths_and_mean() -> Result<()> {
    let df = DataFrame::new(vec![Series::new(
        POS_CHANGE_SIGNAL.into(),
        vec!["buy", "buy", "meh", "buy", "sell", "sell", "sell"],
    )
    .into_column()])?;

    let runs = run_lengths(&df)?;
    let values: Vec<&str> = runs
        .column("value")?
        .as_materialized_series()
        .str()?
        .into_no_null_iter()
        .collect();
    let counts: Vec<u32> = runs
        .column("count")?
        .as_materialized_series()
        .u32()?
        .into_no_null_iter()
        .collect();
    assert_eq!(values, vec!["buy", "meh", "buy", "sell"]);
    assert_eq!(counts, vec![2, 1, 1, 3]);

    let means = mean_run_length(&df)?;
    let values: Vec<&str> = means
        .column("value")?
        .as_materialized_series()
        .str()?
        .into_no_null_iter()
        .collect();
    let avg: Vec<f64> = means
        .column("mean_run_length")?
        .as_materialized_series()
        .f64()?
        .into_no_null_iter()
        .collect();
    assert_eq!(values, vec!["buy", "meh", "sell"]);
    assert_eq!(avg, vec![1.5, 1.0, 3.0]);
    Ok(())
}
