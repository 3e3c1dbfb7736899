use axum::{
    http::{header::HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use crate::Error;

pub const ERROR_KIND_HEADER: &str = "x-error-kind";

/// HTTP status for each error kind. "Nothing to show" is 404, a bad request
/// is 400, no upload yet is 503, defects are 500.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UnknownFlag(_) | Error::EmptySeries | Error::NoValidRows => StatusCode::NOT_FOUND,
        Error::MissingFlag
        | Error::IndexOutOfRange { .. }
        | Error::InvalidRange { .. }
        | Error::NoFlags
        | Error::Input(_)
        | Error::Json(_) => StatusCode::BAD_REQUEST,
        Error::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        Error::Invariant(_)
        | Error::Config(_)
        | Error::Storage(_)
        | Error::IO(_)
        | Error::Parquet(_)
        | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed ({}): {}", self.kind(), self);
        } else {
            warn!("Request rejected ({}): {}", self.kind(), self);
        }

        (
            status,
            [(HeaderName::from_static(ERROR_KIND_HEADER), self.kind())],
            self.to_string(),
        )
            .into_response()
    }
}
