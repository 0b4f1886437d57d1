use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::SessionError;
use crate::api::ErrorResponse;

/// converts `SessionError` into 401 or 500 responses
#[derive(Debug)]
pub struct SessionRejection(pub SessionError);

impl From<SessionError> for SessionRejection {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let status = if self.0.is_unauthenticated() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}
