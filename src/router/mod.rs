//! # Router Module
//!
//! Path matching and route resolution. Templates use `{name}` placeholders
//! and `*` wildcards and compile to anchored, case-insensitive regexes at
//! registration time, so matching itself is infallible.
//!
//! Precedence: per method, literal routes are tried before wildcard routes;
//! within each group, registration order decides and the first match wins.

mod route;
#[allow(clippy::module_inception)]
mod router;

pub use route::{PathParams, Route, RouteError, MAX_INLINE_PARAMS};
pub use router::{Handler, RouteMatch, Router};
