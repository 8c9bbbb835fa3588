//! # HTTP Model
//!
//! Request/response abstractions shared by the router, the middleware
//! pipeline and the validation layer.
//!
//! The framework is transport-agnostic: an adapter (WSGI-style gateway,
//! serverless event bridge, embedded server) builds an [`HttpRequest`],
//! calls [`Application::invoke`](crate::application::Application::invoke)
//! and serializes the returned [`HttpResponse`] back to its native
//! protocol. Nothing in this module performs I/O.
//!
//! - [`HttpHeaders`] - multi-valued headers with case-insensitive names
//! - [`CookieJar`] / [`HttpCookie`] - request cookie parsing and
//!   `Set-Cookie` serialization for responses
//! - [`QueryString`] - decoded query parameters with scalar coercion
//! - [`ParsedBody`] - content-type driven body parsing (JSON, form,
//!   multipart, YAML, plain text), computed lazily per request
//! - [`HttpRequest`] / [`HttpResponse`] - the per-request value pair

mod body;
mod cookies;
mod headers;
mod query;
mod request;
mod response;

pub use body::{parse_content_type, MultipartPart, ParsedBody};
pub use cookies::{parse_cookie_header, CookieJar, HttpCookie, SameSite};
pub use headers::HttpHeaders;
pub use query::{coerce_scalar, QueryString};
pub use request::HttpRequest;
pub use response::HttpResponse;
