//! Request error taxonomy
//!
//! Validation and not-found conditions surface to API consumers as structured
//! JSON error responses. Mirror failures never appear here: they are logged and
//! swallowed at the sync boundary (see `sync`). Only a failed write to the
//! authoritative local copy turns into a 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed user input, maps to 400
    #[error("{0}")]
    Validation(String),

    /// Unknown product id, maps to 404
    #[error("Product not found")]
    NotFound,

    /// Local disk failure on the authoritative copy, maps to 500
    #[error("storage failure: {0}")]
    Storage(#[from] std::io::Error),

    /// Anything else that went wrong while handling the request, maps to 500
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            ApiError::Storage(io).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message_matches_api_contract() {
        assert_eq!(ApiError::NotFound.to_string(), "Product not found");
    }
}
