use serde::{Deserialize, Serialize};
use crate::models::FlagSummary;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub generation: u64,
    pub flags: usize,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub flag: Option<String>,
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub generation: u64,
    pub flags: Vec<FlagSummary>,
}

#[derive(Debug, Serialize)]
pub struct FlagsResponse {
    pub generation: u64,
    pub flags: Vec<FlagSummary>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub flag: String,
    pub generation: u64,
}
