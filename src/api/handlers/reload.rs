use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::info;
use crate::{AppState, Error, ReloadResponse};

pub async fn reload_flag(
    State(state): State<Arc<AppState>>,
    Path(flag): Path<String>,
) -> Result<Json<ReloadResponse>, Error> {
    let generation = state.store.reload(&flag).await?;
    info!("Cleared cached aggregate for {} (generation {})", flag, generation);
    Ok(Json(ReloadResponse { flag, generation }))
}
