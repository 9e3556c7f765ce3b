//! Error types for the datastore cache
//!
//! Argument errors are raised to the caller. Store failures never reach this
//! type: the facade converts them into boolean/enum results.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache facade and its HTTP host.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is neither a string nor a sequence carrying a string second item
    #[error("Key must be a string or a tuple with the key as second item")]
    InvalidKeyType,

    /// Time is not a usable number
    #[error(
        "Time must either be a relative number of seconds from current time \
         (up to 1 month), or an absolute Unix epoch time"
    )]
    InvalidTimeType,

    /// Argument outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Stored payload could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidKeyType
            | CacheError::InvalidTimeType
            | CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache facade.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_errors_are_bad_requests() {
        for err in [
            CacheError::InvalidKeyType,
            CacheError::InvalidTimeType,
            CacheError::InvalidArgument("max_items".to_string()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_internal_errors_are_server_errors() {
        let response = CacheError::Internal("join failed".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
