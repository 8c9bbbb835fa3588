use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::errors::HttpError;
use crate::http::{parse_cookie_header, CookieJar, HttpHeaders, ParsedBody, QueryString};
use crate::router::{Handler, PathParams, Route};

/// A single in-flight HTTP request.
///
/// Built by a transport adapter, threaded mutably through the middleware
/// pipeline and finally handed to the resolved handler. Cookies and the
/// parsed body are computed on first access and memoized; validation
/// middleware may replace the parsed body with a coerced value.
pub struct HttpRequest {
    method: Method,
    path: String,
    /// Request headers, mutable so middleware can annotate the request
    pub headers: HttpHeaders,
    query: QueryString,
    body: Vec<u8>,
    cookies: OnceCell<CookieJar>,
    parsed_body: OnceCell<Result<ParsedBody, HttpError>>,
    path_params: PathParams,
    /// Free-form per-request state shared between middlewares
    pub attributes: HashMap<String, Value>,
    route: Option<Arc<Route>>,
    handler: Option<Handler>,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `handler` is a trait object without Debug; format everything else.
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("cookies", &self.cookies)
            .field("parsed_body", &self.parsed_body)
            .field("path_params", &self.path_params)
            .field("attributes", &self.attributes)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl HttpRequest {
    /// Create a request for `method` and `uri`. A query string embedded in
    /// the uri (`/pets?limit=10`) is split off and decoded.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        let uri = uri.as_ref();
        let (path, query) = match uri.split_once('?') {
            Some((path, raw_query)) => (path.to_string(), QueryString::parse(raw_query)),
            None => (uri.to_string(), QueryString::new()),
        };
        Self {
            method,
            path,
            headers: HttpHeaders::new(),
            query,
            body: Vec::new(),
            cookies: OnceCell::new(),
            parsed_body: OnceCell::new(),
            path_params: PathParams::new(),
            attributes: HashMap::new(),
            route: None,
            handler: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &QueryString {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request cookies, parsed from the `Cookie` header on first access.
    pub fn cookies(&self) -> &CookieJar {
        self.cookies.get_or_init(|| {
            self.headers
                .get("cookie")
                .map(parse_cookie_header)
                .unwrap_or_default()
        })
    }

    /// The body interpreted per its `Content-Type`, parsed once and
    /// memoized. A parse failure is memoized too and re-returned on every
    /// access.
    pub fn parsed_body(&self) -> Result<&ParsedBody, HttpError> {
        let result = self
            .parsed_body
            .get_or_init(|| ParsedBody::parse(self.headers.get("content-type"), &self.body));
        match result {
            Ok(body) => Ok(body),
            Err(err) => Err(err.clone()),
        }
    }

    /// Replace the parsed body, discarding any memoized parse. Validation
    /// middleware uses this to install the coerced, validated value.
    pub fn set_parsed_body(&mut self, body: ParsedBody) {
        self.parsed_body = OnceCell::with_value(Ok(body));
    }

    /// Value captured for a `{name}` placeholder of the matched route.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn set_path_params(&mut self, params: PathParams) {
        self.path_params = params;
    }

    /// The route this request resolved to, once routing has run.
    #[must_use]
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn set_route(&mut self, route: Arc<Route>) {
        self.route = Some(route);
    }

    /// The handler the router resolved for this request, consumed by the
    /// terminal middleware.
    #[must_use]
    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn set_handler(&mut self, handler: Handler) {
        self.handler = Some(handler);
    }
}
