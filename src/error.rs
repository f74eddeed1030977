//! Error types with HTTP status code mapping.
//!
//! Every error body is served as `text/plain; charset=utf-8` so that a
//! crafted `uri` or `format` value can never be reflected back as
//! browser-executable content.
use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Failures of the triple store capability.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Store-side timeout, kept distinct so callers can tell it apart.
    #[error("store query timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Request-path errors. Validation messages are fixed strings naming only
/// the parameter; the attacker-controlled value never appears in them.
#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("Parameter [{0}] is required")]
    MissingParameter(&'static str),

    #[error("Parameter [{0}] should be an RFC 3986 compliant URI")]
    InvalidUri(&'static str),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("request processing was interrupted")]
    Interrupted,
}

impl ResponseError for ExploreError {
    fn status_code(&self) -> StatusCode {
        match self {
            ExploreError::MissingParameter(_) | ExploreError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            ExploreError::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ExploreError::Store(_) | ExploreError::Interrupted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).content_type(ContentType::plaintext()).body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(ExploreError::MissingParameter("uri").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ExploreError::InvalidUri("uri").status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn timeouts_are_distinguishable() {
        let e = ExploreError::Store(StoreError::Timeout("deadline exceeded".into()));
        assert_eq!(e.status_code(), StatusCode::GATEWAY_TIMEOUT);
        let e = ExploreError::Store(StoreError::Query("boom".into()));
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_bodies_are_plain_text() {
        let resp = ExploreError::InvalidUri("uri").error_response();
        let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(ct.starts_with("text/plain"));
    }
}
