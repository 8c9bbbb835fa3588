use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::errors::DispatchError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{Middleware, Next};

/// Terminal middleware that invokes the handler the router resolved.
///
/// Installed last by the application. It never calls its cursor; a handler
/// failure (`HttpError`) is translated into a plain-text response carrying
/// the error status and message, so known failures stay ordinary responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestHandler;

impl RequestHandler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestHandler {
    fn handle(
        &self,
        request: &mut HttpRequest,
        _next: Next,
    ) -> Result<HttpResponse, DispatchError> {
        let Some(handler) = request.handler().map(Arc::clone) else {
            debug!(path = %request.path(), "request reached the terminal stage without a handler");
            return Ok(HttpResponse::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "no handler resolved for request",
            ));
        };
        match handler(request) {
            Ok(response) => Ok(response),
            Err(err) => {
                debug!(status = %err.status, message = %err.message, "handler returned an error");
                Ok(HttpResponse::text(err.status, &err.message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HttpError;
    use crate::middleware::MiddlewarePipeline;
    use http::Method;

    #[test]
    fn test_invokes_resolved_handler() {
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.append(RequestHandler::new());

        let mut request = HttpRequest::new(Method::GET, "/pets");
        request.set_handler(Arc::new(|_req| Ok(HttpResponse::text(StatusCode::OK, "pets"))));

        let response = pipeline.invoke(&mut request).expect("handler runs");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body_text(), "pets");
    }

    #[test]
    fn test_http_error_becomes_response() {
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.append(RequestHandler::new());

        let mut request = HttpRequest::new(Method::GET, "/pets/999");
        request.set_handler(Arc::new(|_req| {
            Err(HttpError::new(StatusCode::NOT_FOUND, "no such pet"))
        }));

        let response = pipeline.invoke(&mut request).expect("error translated");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body_text(), "no such pet");
    }

    #[test]
    fn test_missing_handler_is_internal_error() {
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.append(RequestHandler::new());

        let mut request = HttpRequest::new(Method::GET, "/");
        let response = pipeline.invoke(&mut request).expect("still a response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
