use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::info;
use crate::{AppState, Error, FlagsResponse};
use crate::models::FlagSummary;
use crate::store::summarize;

pub async fn list_flags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlagsResponse>, Error> {
    let generation = state.store.generation().await;
    let flags = state.store.summaries().await?;

    info!("Returning summaries for {} flags", flags.len());
    Ok(Json(FlagsResponse { generation, flags }))
}

pub async fn get_flag(
    State(state): State<Arc<AppState>>,
    Path(flag): Path<String>,
) -> Result<Json<FlagSummary>, Error> {
    let snapshot = state.store.snapshot().await;
    let records = snapshot.records(&flag)?;
    let aggregation = state.store.aggregation_in(&snapshot, &flag)?;

    Ok(Json(summarize(&flag, records.generation, &aggregation)))
}
