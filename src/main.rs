// External crates
use anyhow::{bail, Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use log::info;
use std::path::PathBuf;

// Local modules
use ohlcv_prep::config::PipelineConfig;
use ohlcv_prep::constants::{DEFAULT_PATTERN_SMOOTHING_WINDOW, FEATURES_FILE_NAME, TARGET_FILE_NAME};
use ohlcv_prep::pipeline::prep_data;
use ohlcv_prep::util::file_utils::{read_csv_file, write_csv_file};

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Prepare labels and technical features from a vendor OHLCV CSV
#[derive(Parser, Debug)]
#[command(name = "ohlcv-prep", version)]
struct Cli {
    /// Vendor CSV with *_price, volume, open_interest and datetime columns
    #[arg(short, long, value_name = "CSV")]
    input: PathBuf,

    /// Directory receiving features.csv and target.csv
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// JSON pipeline configuration; replaces the individual window flags
    #[arg(short, long, conflicts_with_all = ["lags", "lag", "multiplier"])]
    config: Option<PathBuf>,

    /// Indicator lookback windows, comma separated
    #[arg(long, value_delimiter = ',')]
    lags: Option<Vec<usize>>,

    /// Forward horizon of the desired position label
    #[arg(long)]
    lag: Option<usize>,

    /// Scale of the discretized label
    #[arg(long, allow_negative_numbers = true)]
    multiplier: Option<i64>,

    /// WMA window smoothing the candlestick pattern signals
    #[arg(long, default_value_t = DEFAULT_PATTERN_SMOOTHING_WINDOW)]
    pattern_window: usize,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        if let Some(path) = &self.config {
            return PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()));
        }
        let (Some(lags), Some(lag), Some(multiplier)) = (&self.lags, self.lag, self.multiplier)
        else {
            bail!("either --config or all of --lags, --lag and --multiplier are required");
        };
        let config = PipelineConfig::new(lags.clone(), lag, multiplier)
            .with_pattern_smoothing_window(self.pattern_window);
        config.validate()?;
        Ok(config)
    }
}

fn long_version() -> &'static str {
    let text = format!(
        "{} ({}, {} build, {})",
        built_info::PKG_VERSION,
        built_info::TARGET,
        built_info::PROFILE,
        built_info::RUSTC_VERSION
    );
    Box::leak(text.into_boxed_str())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Cli::command().long_version(long_version()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let config = cli.pipeline_config()?;
    info!("Using configuration: {:?}", config);

    let raw = read_csv_file(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let (x, y) = prep_data(&raw, &config).context("Preparation failed")?;

    write_csv_file(&x, cli.output_dir.join(FEATURES_FILE_NAME))
        .context("Failed to write feature matrix")?;
    write_csv_file(&y, cli.output_dir.join(TARGET_FILE_NAME))
        .context("Failed to write target matrix")?;

    info!(
        "Done: {} rows, {} features written to {}",
        x.height(),
        x.width(),
        cli.output_dir.display()
    );
    Ok(())
}
