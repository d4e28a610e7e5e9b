// External crates
use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a data error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ColumnNormalizer,
    LabelGenerator,
    FeatureGenerator,
    Splitter,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ColumnNormalizer => "column normalizer",
            Stage::LabelGenerator => "label generator",
            Stage::FeatureGenerator => "feature generator",
            Stage::Splitter => "splitter",
        };
        f.write_str(name)
    }
}

/// Errors raised while preparing labels and features.
///
/// Every failure is fatal for the whole run: there is no partial result.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("{stage}: required column `{column}` not found")]
    MissingColumn { stage: Stage, column: String },

    #[error("{stage}: insufficient data: {reason}")]
    InsufficientData { stage: Stage, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("feature generator: cannot parse timestamp {value:?} at row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PrepError {
    pub fn missing_column(stage: Stage, column: &str) -> Self {
        PrepError::MissingColumn {
            stage,
            column: column.to_string(),
        }
    }

    pub fn insufficient_data(stage: Stage, reason: impl Into<String>) -> Self {
        PrepError::InsufficientData {
            stage,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
