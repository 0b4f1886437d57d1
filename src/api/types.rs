use serde::Serialize;

use crate::SessionError;

/// JSON body returned when a session cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&SessionError> for ErrorResponse {
    fn from(err: &SessionError) -> Self {
        ErrorResponse {
            error: err.to_string(),
            code: err.code().to_owned(),
        }
    }
}
