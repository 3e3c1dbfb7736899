use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::{info, warn};
use crate::{AppState, Error, UploadResponse};
use crate::models::UploadDocument;

pub async fn upload_records(
    State(state): State<Arc<AppState>>,
    Json(document): Json<UploadDocument>,
) -> Result<Json<UploadResponse>, Error> {
    let filename = document
        .filename
        .clone()
        .unwrap_or_else(|| "upload".to_string());

    info!(
        "Received upload {} with {} records",
        filename,
        document.records.len()
    );

    let snapshot = state.store.load(document.filename, document.records).await?;
    let flags = state.store.summaries().await?;

    Ok(Json(UploadResponse {
        message: format!("Parsed {} flags from {}.", snapshot.flag_count(), filename),
        generation: snapshot.generation,
        flags,
    }))
}

/// Replaces one flag's records, leaving every other flag on its generation.
/// Records tagged with a different flag are ignored.
pub async fn upload_flag_records(
    State(state): State<Arc<AppState>>,
    Path(flag): Path<String>,
    Json(document): Json<UploadDocument>,
) -> Result<Json<UploadResponse>, Error> {
    let received = document.records.len();
    let records: Vec<_> = document
        .records
        .into_iter()
        .filter(|record| record.flag == flag)
        .collect();

    info!(
        "Received {} records for flag {} ({} for other flags ignored)",
        records.len(),
        flag,
        received - records.len()
    );

    if records.is_empty() {
        warn!("Upload for flag {} had no matching records", flag);
        return Err(Error::NoFlags);
    }

    let count = records.len();
    let generation = state.store.replace_flag(&flag, records).await?;
    let flags = state.store.summaries().await?;

    Ok(Json(UploadResponse {
        message: format!("Replaced {} with {} records.", flag, count),
        generation,
        flags,
    }))
}
