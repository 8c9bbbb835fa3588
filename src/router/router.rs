use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::errors::{HttpError, NotFoundError};
use crate::http::{HttpRequest, HttpResponse};
use crate::router::{PathParams, Route};

/// A request handler resolved by the router.
///
/// Handlers receive the request mutably (attributes, parsed body) and
/// either produce a response or a known HTTP-level failure.
pub type Handler =
    Arc<dyn Fn(&mut HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync>;

/// Result of successfully matching a request to a registered route.
#[derive(Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: Arc<Route>,
    /// The handler registered for the route
    pub handler: Handler,
    /// Placeholder values captured from the request path
    pub path_params: PathParams,
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `handler` is a trait object without Debug; format everything else.
        f.debug_struct("RouteMatch")
            .field("route", &self.route)
            .field("path_params", &self.path_params)
            .finish_non_exhaustive()
    }
}

/// Maps `(method, path)` pairs to handlers.
///
/// Routes are kept per method, in registration order, except that wildcard
/// routes always sort after literal routes. The sort is stable, so two
/// literal routes (or two wildcard routes) keep their relative registration
/// order and the first match wins.
#[derive(Clone, Default)]
pub struct Router {
    table: HashMap<Method, Vec<(Arc<Route>, Handler)>>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route` for `method`.
    ///
    /// Registering the same template twice for one method replaces the
    /// earlier handler.
    pub fn append(&mut self, method: Method, route: Route, handler: Handler) {
        let entries = self.table.entry(method).or_default();
        if let Some(existing) = entries.iter_mut().find(|(r, _)| **r == route) {
            existing.1 = handler;
            return;
        }
        entries.push((Arc::new(route), handler));
        entries.sort_by_key(|(route, _)| route.is_wildcard());
    }

    /// Number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.values().all(Vec::is_empty)
    }

    /// Match a request to a route.
    ///
    /// Routes registered for `method` are tried in precedence order and the
    /// first match wins.
    pub fn match_route(&self, method: &Method, uri: &str) -> Result<RouteMatch, NotFoundError> {
        debug!(method = %method, uri = %uri, "route match attempt");

        if let Some(entries) = self.table.get(method) {
            for (route, handler) in entries {
                if let Some(path_params) = route.matches(uri) {
                    debug!(
                        method = %method,
                        uri = %uri,
                        template = %route.template(),
                        path_params = ?path_params,
                        "route matched"
                    );
                    return Ok(RouteMatch {
                        route: Arc::clone(route),
                        handler: Arc::clone(handler),
                        path_params,
                    });
                }
            }
        }

        warn!(method = %method, uri = %uri, "no route matched");
        Err(NotFoundError::new(method.clone(), uri))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut routes: Vec<String> = self
            .table
            .iter()
            .flat_map(|(method, entries)| {
                entries
                    .iter()
                    .map(move |(route, _)| format!("{method} {}", route.template()))
            })
            .collect();
        routes.sort();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}
