// External crates
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// Local modules
use crate::constants::DEFAULT_PATTERN_SMOOTHING_WINDOW;
use crate::error::{PrepError, Result};

/// Parameters for a full label + feature preparation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Lookback windows for the bulk indicator families
    pub lags: Vec<usize>,
    /// Forward window of the desired-position label
    pub lag: usize,
    /// Scale applied to the standardized return before truncation
    pub multiplier: i64,
    /// WMA window used to smooth candlestick pattern signals
    #[serde(default = "default_pattern_smoothing_window")]
    pub pattern_smoothing_window: usize,
}

fn default_pattern_smoothing_window() -> usize {
    DEFAULT_PATTERN_SMOOTHING_WINDOW
}

impl PipelineConfig {
    pub fn new(lags: Vec<usize>, lag: usize, multiplier: i64) -> Self {
        Self {
            lags,
            lag,
            multiplier,
            pattern_smoothing_window: DEFAULT_PATTERN_SMOOTHING_WINDOW,
        }
    }

    pub fn with_pattern_smoothing_window(mut self, window: usize) -> Self {
        self.pattern_smoothing_window = window;
        self
    }

    /// Loads a configuration from a JSON file and validates it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every window before any data is touched.
    ///
    /// Bulk lags must be at least 2 because several families derive a
    /// half-lag window (`lag / 2`) that has to stay positive.
    pub fn validate(&self) -> Result<()> {
        if self.lags.is_empty() {
            return Err(PrepError::InvalidConfiguration(
                "`lags` must contain at least one window".into(),
            ));
        }
        if let Some(bad) = self.lags.iter().find(|&&l| l < 2) {
            return Err(PrepError::InvalidConfiguration(format!(
                "every entry of `lags` must be >= 2, got {}",
                bad
            )));
        }
        if self.lag == 0 {
            return Err(PrepError::InvalidConfiguration(
                "`lag` must be a positive integer".into(),
            ));
        }
        if self.pattern_smoothing_window == 0 {
            return Err(PrepError::InvalidConfiguration(
                "`pattern_smoothing_window` must be a positive integer".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_smoothing_window_from_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"lags": [5, 10], "lag": 10, "multiplier": 100}"#).unwrap();
        assert_eq!(config.pattern_smoothing_window, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_windows() {
        assert!(matches!(
            PipelineConfig::new(vec![], 10, 100).validate(),
            Err(PrepError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            PipelineConfig::new(vec![5, 1], 10, 100).validate(),
            Err(PrepError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            PipelineConfig::new(vec![5], 0, 100).validate(),
            Err(PrepError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            PipelineConfig::new(vec![5], 10, 100)
                .with_pattern_smoothing_window(0)
                .validate(),
            Err(PrepError::InvalidConfiguration(_))
        ));
    }
}
