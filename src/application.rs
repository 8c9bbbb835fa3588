use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::errors::{DispatchError, HttpError};
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{Middleware, MiddlewarePipeline, RequestHandler};
use crate::router::{Handler, Route, RouteError, Router};

const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
];

/// Collects routes and middleware, then freezes them into an
/// [`Application`].
///
/// Registration after [`build`](Self::build) is impossible by
/// construction: the builder is consumed and the application holds an
/// immutable router and pipeline, so no locking is needed while serving.
#[derive(Default)]
pub struct ApplicationBuilder {
    routes: Vec<(Method, Route, Handler)>,
    pending_error: Option<RouteError>,
    middleware: MiddlewarePipeline,
}

impl ApplicationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware stage. Stages run in registration order, before
    /// the terminal handler-invoking stage.
    #[must_use]
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.append(middleware);
        self
    }

    /// Register `handler` for `method` and `template`.
    ///
    /// An invalid template is reported by [`build`](Self::build); the first
    /// such error wins.
    #[must_use]
    pub fn route(
        mut self,
        method: Method,
        template: &str,
        handler: impl Fn(&mut HttpRequest) -> Result<HttpResponse, HttpError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.append(method, template, Arc::new(handler));
        self
    }

    /// Register `handler` for every supported method.
    #[must_use]
    pub fn any(
        mut self,
        template: &str,
        handler: impl Fn(&mut HttpRequest) -> Result<HttpResponse, HttpError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let handler: Handler = Arc::new(handler);
        for method in SUPPORTED_METHODS {
            self.append(method, template, Arc::clone(&handler));
        }
        self
    }

    fn append(&mut self, method: Method, template: &str, handler: Handler) {
        match Route::parse(template) {
            Ok(route) => self.routes.push((method, route, handler)),
            Err(err) => {
                if self.pending_error.is_none() {
                    self.pending_error = Some(err);
                }
            }
        }
    }

    /// Freeze the registered routes and middleware into an application.
    pub fn build(self) -> Result<Application, RouteError> {
        if let Some(err) = self.pending_error {
            return Err(err);
        }
        let mut router = Router::new();
        for (method, route, handler) in self.routes {
            router.append(method, route, handler);
        }
        let mut pipeline = self.middleware;
        pipeline.append(RequestHandler::new());
        debug!(routes = router.len(), stages = pipeline.len(), "application built");
        Ok(Application { router, pipeline })
    }
}

macro_rules! method_shorthand {
    ($($name:ident => $method:expr;)+) => {
        impl ApplicationBuilder {
            $(
                #[doc = concat!("Register `handler` for `", stringify!($name), "` requests on `template`.")]
                #[must_use]
                pub fn $name(
                    self,
                    template: &str,
                    handler: impl Fn(&mut HttpRequest) -> Result<HttpResponse, HttpError>
                        + Send
                        + Sync
                        + 'static,
                ) -> Self {
                    self.route($method, template, handler)
                }
            )+
        }
    };
}

method_shorthand! {
    get => Method::GET;
    post => Method::POST;
    put => Method::PUT;
    patch => Method::PATCH;
    delete => Method::DELETE;
    head => Method::HEAD;
    options => Method::OPTIONS;
}

/// An immutable, ready-to-serve application: a frozen router plus the
/// middleware pipeline ending in the terminal request handler.
///
/// The application performs no I/O; a transport adapter builds an
/// [`HttpRequest`], calls [`invoke`](Self::invoke) and serializes the
/// returned response. One `Application` value serves any number of
/// concurrent requests.
pub struct Application {
    router: Router,
    pipeline: MiddlewarePipeline,
}

impl Application {
    /// Dispatch one request through routing and the middleware pipeline.
    ///
    /// A routing miss does not fail dispatch: a synthetic handler carrying
    /// the 404 error is attached instead, so the miss travels the normal
    /// middleware path and middleware observe it like any other request.
    pub fn invoke(&self, request: &mut HttpRequest) -> Result<HttpResponse, DispatchError> {
        let method = request.method().clone();
        let path = request.path().to_string();
        match self.router.match_route(&method, &path) {
            Ok(matched) => {
                request.set_path_params(matched.path_params);
                request.set_route(matched.route);
                request.set_handler(matched.handler);
            }
            Err(not_found) => {
                let error: HttpError = not_found.into();
                request.set_handler(Arc::new(move |_req: &mut HttpRequest| Err(error.clone())));
            }
        }
        self.pipeline.invoke(request)
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}
