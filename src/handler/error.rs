//! Errors a request can end in, each mapped to a status and a
//! `{"message": ...}` body.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required fields missing from the body
    #[error("{0}")]
    Validation(&'static str),

    #[error("Task not found")]
    NotFound,

    #[error("Route not found!")]
    RouteNotFound,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Failed to read request body")]
    BodyRead,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BodyRead => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        http::build_error_response(self.status(), &self.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            other => {
                crate::logger::log_error(&format!("Store error: {other}"));
                Self::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Table;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::RouteNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound {
            table: Table::Tasks,
            id: "x".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(err.to_string(), "Task not found");
    }
}
