//! End-to-end preparation: normalize, label, featurize, split.

// External crates
use log::info;
use polars::prelude::*;

// Local modules
use crate::config::PipelineConfig;
use crate::constants::{OHLCV_COLUMNS, TARGET_COLUMNS};
use crate::error::{PrepError, Result, Stage};
use crate::util::feature_engineering::generate_all_features;
use crate::util::label_generator::prepare_desired_pos;
use crate::util::pre_processor::keep_essentials;

/// Removes the raw `open`, `high`, `low`, `close`, `volume` and
/// `open_interest` columns
pub fn drop_ohlcv_cols(df: &DataFrame) -> Result<DataFrame> {
    for name in OHLCV_COLUMNS.iter() {
        if df.column(name).is_err() {
            return Err(PrepError::missing_column(Stage::Splitter, name));
        }
    }
    Ok(df.drop_many(OHLCV_COLUMNS.iter().copied()))
}

/// Splits a labeled feature table into the feature matrix `X` and the
/// target matrix `y`.
///
/// `y` holds exactly the four label columns in the order
/// `pos_change_signal`, `net_pos_signal`, `desired_pos_change`,
/// `desired_pos_rolling`; `X` holds every other column in its existing order.
pub fn split_features_target(df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
    for name in TARGET_COLUMNS.iter() {
        if df.column(name).is_err() {
            return Err(PrepError::missing_column(Stage::Splitter, name));
        }
    }
    let y = df.select(TARGET_COLUMNS.iter().copied())?;
    let x = df.drop_many(TARGET_COLUMNS.iter().copied());
    Ok((x, y))
}

/// Runs the four stages on a raw vendor frame.
///
/// # Arguments
///
/// * `df` - Raw vendor frame
/// * `config` - Validated before any data is touched
///
/// # Returns
///
/// Row-aligned `(X, y)`
pub fn prep_data(df: &DataFrame, config: &PipelineConfig) -> Result<(DataFrame, DataFrame)> {
    config.validate()?;
    info!("Preparing {} raw rows", df.height());

    let normalized = keep_essentials(df)?;
    let labeled = prepare_desired_pos(&normalized, config.lag, config.multiplier)?;
    let featured = generate_all_features(&labeled, config)?;
    let trimmed = drop_ohlcv_cols(&featured)?;
    let (x, y) = split_features_target(&trimmed)?;

    info!(
        "Prepared X: {} x {}, y: {} x {}",
        x.height(),
        x.width(),
        y.height(),
        y.width()
    );
    Ok((x, y))
}
