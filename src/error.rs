use thiserror::Error;
use tokio::task::JoinError;
use parquet::errors::ParquetError;
use arrow::error::ArrowError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Flag not found in memory; re-upload needed.")]
    UnknownFlag(String),

    #[error("No data for this flag (empty).")]
    EmptySeries,

    #[error("No flag specified.")]
    MissingFlag,

    #[error("Index out of range: [{start_index}, {end_index}] not within [0, {len})")]
    IndexOutOfRange {
        start_index: i64,
        end_index: i64,
        len: usize,
    },

    #[error("Invalid range: start_index {start_index} > end_index {end_index}")]
    InvalidRange { start_index: i64, end_index: i64 },

    #[error("After transformation, no valid rows remain.")]
    NoValidRows,

    #[error("No records loaded; upload an export first.")]
    NotReady,

    #[error("No flags found in this export.")]
    NoFlags,

    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IO(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("General error: {0}")]
    Other(String),
}

impl Error {
    /// Stable identifier callers can branch on without matching message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownFlag(_) => "unknown_flag",
            Error::EmptySeries => "empty_series",
            Error::MissingFlag => "missing_flag",
            Error::IndexOutOfRange { .. } => "index_out_of_range",
            Error::InvalidRange { .. } => "invalid_range",
            Error::NoValidRows => "no_valid_rows",
            Error::NotReady => "not_ready",
            Error::NoFlags => "no_flags",
            Error::Invariant(_) => "invariant",
            Error::Config(_) => "config",
            Error::Input(_) => "input",
            Error::Storage(_) => "storage",
            Error::IO(_) => "io",
            Error::Json(_) => "json",
            Error::Parquet(_) => "parquet",
            Error::Other(_) => "other",
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<ParquetError> for Error {
    fn from(err: ParquetError) -> Self {
        Error::Parquet(err.to_string())
    }
}

impl From<ArrowError> for Error {
    fn from(err: ArrowError) -> Self {
        Error::Parquet(err.to_string())
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}
