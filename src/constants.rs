// Canonical OHLCV column names
pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";
pub const OPEN_INTEREST: &str = "open_interest";

// Vendor columns renamed to their canonical short form
pub const PRICE_RENAMES: [(&str, &str); 4] = [
    ("close_price", "close"),
    ("high_price", "high"),
    ("low_price", "low"),
    ("open_price", "open"),
];

// Vendor metadata dropped by the column normalizer
pub const VENDOR_METADATA_COLUMNS: [&str; 3] = ["exchange", "turnover", "symbol"];

// Raw columns that must never reach the feature matrix
pub const OHLCV_COLUMNS: [&str; 6] = [OPEN, HIGH, LOW, CLOSE, VOLUME, OPEN_INTEREST];

// Timestamp column consumed by the time features
pub const DATETIME_COLUMN: &str = "datetime";

// Label bundle
pub const DESIRED_POS_CHANGE: &str = "desired_pos_change";
pub const DESIRED_POS_ROLLING: &str = "desired_pos_rolling";
pub const POS_CHANGE_SIGNAL: &str = "pos_change_signal";
pub const NET_POS_SIGNAL: &str = "net_pos_signal";

// Order of the target matrix columns
pub const TARGET_COLUMNS: [&str; 4] = [
    POS_CHANGE_SIGNAL,
    NET_POS_SIGNAL,
    DESIRED_POS_CHANGE,
    DESIRED_POS_ROLLING,
];

// Number of quantile buckets for the position change signal
pub const POSITION_SIGNAL_BUCKETS: usize = 5;

// Candlestick pattern smoothing
pub const DEFAULT_PATTERN_SMOOTHING_WINDOW: usize = 300;

// Output file names written by the binary
pub const FEATURES_FILE_NAME: &str = "features.csv";
pub const TARGET_FILE_NAME: &str = "target.csv";
