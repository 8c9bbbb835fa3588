//! # Strada
//!
//! **Strada** is a transport-agnostic HTTP request handling framework: a
//! regex-based router, a composable middleware pipeline and request
//! validation driven by JSON Schema or a full OpenAPI document.
//!
//! ## Overview
//!
//! Strada owns everything between a parsed HTTP request and the response
//! bytes: route matching with path parameter extraction, a middleware
//! chain that ends in the registered handler, lazy body parsing (JSON,
//! form, multipart, YAML), cookies, and schema-driven validation of any
//! request part. It performs no I/O of its own; a transport adapter builds
//! an [`HttpRequest`], calls [`Application::invoke`] and writes the
//! returned [`HttpResponse`] back to the wire.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`router`]** - Path matching and route resolution using regex-based matchers
//! - **[`middleware`]** - The pipeline, the terminal request handler and OpenAPI validation
//! - **[`http`]** - Request/response types, headers, cookies, query strings and body parsing
//! - **[`schema`]** - JSON Schema parsing, validator compilation and `$ref` resolution
//! - **[`application`]** - The builder tying routes and middleware into a dispatchable whole
//! - **[`errors`]** - HTTP-level and dispatch-level error types
//!
//! ## Quick Start
//!
//! ```
//! use http::{Method, StatusCode};
//! use strada::{ApplicationBuilder, HttpRequest, HttpResponse};
//!
//! let app = ApplicationBuilder::new()
//!     .get("/pets/{id}", |req| {
//!         let id = req.path_param("id").unwrap_or("").to_string();
//!         Ok(HttpResponse::text(StatusCode::OK, &id))
//!     })
//!     .build()
//!     .expect("routes are valid");
//!
//! let mut request = HttpRequest::new(Method::GET, "/pets/42");
//! let response = app.invoke(&mut request).expect("dispatch succeeds");
//! assert_eq!(response.body_text(), "42");
//! ```
//!
//! ## Features
//!
//! - **Regex routing**: `{name}` placeholders, custom per-parameter patterns,
//!   `*` wildcards, case-insensitive matching
//! - **Middleware pipeline**: each stage decides whether to call the rest of
//!   the chain, and sees the response on the way back out
//! - **Lazy parsing**: cookies and request bodies parse on first access and
//!   are memoized
//! - **JSON Schema validation**: compiled, cacheable validators with
//!   machine-readable error codes and property paths
//! - **OpenAPI-driven validation**: derive per-route validators for body,
//!   path, query, header and cookie parts straight from the document

pub mod application;
pub mod errors;
pub mod http;
pub mod middleware;
pub mod router;
pub mod schema;

pub use application::{Application, ApplicationBuilder};
pub use errors::{DispatchError, HttpError, NotFoundError};
pub use http::{HttpRequest, HttpResponse};
pub use middleware::{Middleware, MiddlewarePipeline, Next, OpenApiMiddleware};
pub use router::{Route, RouteError, Router};
pub use schema::{build_validator, ValidationError, Validator};
