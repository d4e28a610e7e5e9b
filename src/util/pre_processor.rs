// External crates
use log::{debug, info};
use polars::prelude::*;

// Local modules
use crate::constants::{OPEN_INTEREST, PRICE_RENAMES, VENDOR_METADATA_COLUMNS, VOLUME};
use crate::error::{PrepError, Result, Stage};

/// Renames the vendor `*_price` columns to `open`, `high`, `low`, `close`
///
/// # Arguments
///
/// * `df` - Raw vendor frame
///
/// # Returns
///
/// A renamed copy of the frame, or `MissingColumn` for the first absent
/// price column
pub fn renaming(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    for (vendor, canonical) in PRICE_RENAMES.iter() {
        if out.column(vendor).is_err() {
            return Err(PrepError::missing_column(Stage::ColumnNormalizer, vendor));
        }
        out.rename(vendor, (*canonical).into())?;
    }
    Ok(out)
}

/// Brings a raw vendor frame to the canonical schema.
///
/// Drops the `exchange`, `turnover` and `symbol` metadata when present,
/// renames the price columns and checks that `volume` and `open_interest`
/// exist. Every other column (including `datetime`) is kept as is.
///
/// # Arguments
///
/// * `df` - Raw vendor frame
///
/// # Returns
///
/// The normalized copy; the input frame is not modified
pub fn keep_essentials(df: &DataFrame) -> Result<DataFrame> {
    info!("column normalizer: {} rows, {} columns", df.height(), df.width());

    for required in [VOLUME, OPEN_INTEREST] {
        if df.column(required).is_err() {
            return Err(PrepError::missing_column(Stage::ColumnNormalizer, required));
        }
    }

    let mut out = df.clone();
    for metadata in VENDOR_METADATA_COLUMNS.iter() {
        if out.column(metadata).is_ok() {
            out = out.drop(metadata)?;
        }
    }
    let out = renaming(&out)?;

    debug!("column normalizer: columns {:?}", out.get_column_names());
    Ok(out)
}
