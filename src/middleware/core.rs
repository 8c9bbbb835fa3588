use std::sync::Arc;

use crate::errors::DispatchError;
use crate::http::{HttpRequest, HttpResponse};

/// Anything the middleware chain can continue into once it is exhausted.
///
/// The pipeline itself implements [`Middleware`], so nesting a pipeline
/// inside another one threads the outer cursor in as the inner terminal
/// continuation.
pub trait Continuation: Send + Sync {
    fn proceed(&self, request: &mut HttpRequest) -> Result<HttpResponse, DispatchError>;
}

/// A single stage of the request pipeline.
///
/// A middleware may produce a response without calling `next` (short
/// circuit), call `next.run(request)` exactly once and post-process the
/// result, or propagate an error. `Next` is consumed by `run`, so calling
/// the remainder of the chain twice does not compile.
pub trait Middleware: Send + Sync {
    fn handle(
        &self,
        request: &mut HttpRequest,
        next: Next,
    ) -> Result<HttpResponse, DispatchError>;
}

/// Cursor over the remainder of a middleware chain.
///
/// Each call to [`Next::run`] advances past one middleware; when the chain
/// is exhausted the terminal [`Continuation`] takes over. Cloning is cheap
/// (two `Arc` clones and an index), which is what lets `Next` itself act as
/// a continuation for a nested pipeline.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    terminal: Arc<dyn Continuation>,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Middleware>]>, terminal: Arc<dyn Continuation>) -> Self {
        Self {
            chain,
            index: 0,
            terminal,
        }
    }

    /// Hand the request to the next stage of the chain.
    pub fn run(self, request: &mut HttpRequest) -> Result<HttpResponse, DispatchError> {
        match self.chain.get(self.index) {
            Some(middleware) => {
                let middleware = Arc::clone(middleware);
                let next = Next {
                    chain: self.chain,
                    index: self.index + 1,
                    terminal: self.terminal,
                };
                middleware.handle(request, next)
            }
            None => self.terminal.proceed(request),
        }
    }
}

impl Continuation for Next {
    fn proceed(&self, request: &mut HttpRequest) -> Result<HttpResponse, DispatchError> {
        self.clone().run(request)
    }
}

/// A [`Middleware`] built from a closure.
///
/// Produced by [`middleware_fn`]; useful for one-off stages in application
/// setup and tests.
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut HttpRequest, Next) -> Result<HttpResponse, DispatchError> + Send + Sync,
{
    fn handle(
        &self,
        request: &mut HttpRequest,
        next: Next,
    ) -> Result<HttpResponse, DispatchError> {
        (self.0)(request, next)
    }
}

/// Wrap a closure as a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&mut HttpRequest, Next) -> Result<HttpResponse, DispatchError> + Send + Sync,
{
    FnMiddleware(f)
}
