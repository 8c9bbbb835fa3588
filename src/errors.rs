//! Error taxonomy for the dispatch core.
//!
//! Three families of failure flow through the framework:
//!
//! - [`HttpError`] - the boundary type between "business logic failed in a
//!   known way" and "an HTTP response must be produced". The terminal
//!   request-handler middleware translates it into a response.
//! - [`NotFoundError`] - routing failure carrying the method and uri. It is
//!   deferred into the normal middleware path as a synthetic handler, so a
//!   404 is an ordinary response, never a process failure.
//! - [`DispatchError`] - the error channel of the middleware pipeline.
//!   Validation failures and `HttpError`s propagate through it unless
//!   intercepted; `EmptyPipeline` is a configuration bug and must not be
//!   caught and retried.
//!
//! The core never logs or swallows errors itself; observability is the
//! caller's concern.

use http::{Method, StatusCode};
use thiserror::Error;

use crate::schema::ValidationError;

/// Generic HTTP-level error carrying a status code and a message.
///
/// Handlers return this to signal a known failure; the terminal middleware
/// converts it into an [`HttpResponse`](crate::http::HttpResponse) with the
/// carried status and message as body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    /// HTTP status code of the eventual response
    pub status: StatusCode,
    /// Human-readable message, used as the response body
    pub message: String,
}

impl HttpError {
    /// Create a new error with an explicit status code.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a `400 Bad Request` error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Shorthand for a `500 Internal Server Error`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// No route matched the requested method and uri.
///
/// Returned by [`Router::match_route`](crate::router::Router::match_route);
/// the [`Application`](crate::application::Application) converts it into a
/// 404 [`HttpError`] travelling the regular middleware path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not match any resource for {method} {uri}")]
pub struct NotFoundError {
    /// Method of the unmatched request
    pub method: Method,
    /// Path of the unmatched request
    pub uri: String,
}

impl NotFoundError {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
        }
    }
}

impl From<NotFoundError> for HttpError {
    fn from(err: NotFoundError) -> Self {
        HttpError::new(StatusCode::NOT_FOUND, err.to_string())
    }
}

/// Error channel of the middleware pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A known HTTP-level failure; translated into a response by the
    /// terminal request-handler middleware when it reaches it.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// A schema validation failure raised by validation middleware.
    /// Translation into a client-facing payload is the caller's decision.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The pipeline was invoked with no terminating middleware installed.
    /// This is a programmer error, not a runtime condition.
    #[error("middleware pipeline is empty")]
    EmptyPipeline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_converts_to_404() {
        let err = NotFoundError::new(Method::GET, "/missing");
        let http: HttpError = err.into();
        assert_eq!(http.status, StatusCode::NOT_FOUND);
        assert!(http.message.contains("/missing"));
        assert!(http.message.contains("GET"));
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError::bad_request("malformed body");
        assert_eq!(err.to_string(), "malformed body");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
