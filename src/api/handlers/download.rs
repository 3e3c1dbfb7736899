use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};
use crate::{AppState, DownloadQuery, Error};

pub async fn download_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadQuery>,
) -> Result<Response, Error> {
    let flag = match params.flag.as_deref().map(str::trim) {
        Some(flag) if !flag.is_empty() => flag.to_string(),
        _ => {
            warn!("Download request without a flag");
            return Err(Error::MissingFlag);
        }
    };

    info!(
        "Received download request - Flag: {}, Range: [{:?}, {:?}]",
        flag, params.start_index, params.end_index
    );

    let export = state
        .store
        .get_export(&flag, params.start_index, params.end_index)
        .await?;

    let disposition = content_disposition(&export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response())
}

/// `attachment` disposition for `filename`. Quotes, backslashes and control
/// characters are dropped so the quoted-string stays well formed.
pub fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
