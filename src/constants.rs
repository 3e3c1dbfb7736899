use lazy_static::lazy_static;

// Column names of the exported table
pub const CSV_OFFSET_COLUMN: &str = "timestamp";
pub const CSV_METRIC_COLUMN: &str = "metric";

// Column names of parquet record files
pub const RECORD_FLAG_COLUMN: &str = "flag";
pub const RECORD_TIMESTAMP_COLUMN: &str = "start_date";
pub const RECORD_VALUE_COLUMN: &str = "value";

// Number of day aggregates shown per flag summary
pub const PREVIEW_ROWS: usize = 5;

pub const RECORDS_DIR: &str = "records";
pub const EXPORTS_DIR: &str = "exports";
pub const AGGREGATES_DIR: &str = "aggregates";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 512;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

lazy_static! {
    /// Timestamp layouts carrying an explicit UTC offset. The wall-clock
    /// date written in the string is kept, the offset is not applied.
    pub static ref OFFSET_TIMESTAMP_FORMATS: Vec<&'static str> = vec![
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    pub static ref NAIVE_TIMESTAMP_FORMATS: Vec<&'static str> = vec![
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];

    pub static ref DATE_ONLY_FORMATS: Vec<&'static str> = vec![
        "%Y-%m-%d",
        "%Y/%m/%d",
    ];
}
