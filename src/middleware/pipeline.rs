use std::sync::Arc;

use crate::errors::DispatchError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{Continuation, Middleware, Next};

/// An ordered chain of middlewares.
///
/// Stages run in append order. The last stage must produce a response
/// without calling its cursor; running past the end of the chain is a
/// configuration bug and fails with [`DispatchError::EmptyPipeline`].
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    queue: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware stage to the end of the chain.
    pub fn append<M: Middleware + 'static>(&mut self, middleware: M) {
        self.queue.push(Arc::new(middleware));
    }

    /// Append an already shared middleware stage.
    pub fn append_arc(&mut self, middleware: Arc<dyn Middleware>) {
        self.queue.push(middleware);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run the whole chain over `request`.
    ///
    /// Each invocation builds a fresh cursor, so a pipeline can serve any
    /// number of requests concurrently.
    pub fn invoke(&self, request: &mut HttpRequest) -> Result<HttpResponse, DispatchError> {
        let chain: Arc<[Arc<dyn Middleware>]> = self.queue.iter().map(Arc::clone).collect();
        Next::new(chain, Arc::new(Exhausted)).run(request)
    }
}

impl Middleware for MiddlewarePipeline {
    /// Nest this pipeline inside another chain. The inner chain falls
    /// through to the outer cursor when exhausted.
    fn handle(
        &self,
        request: &mut HttpRequest,
        next: Next,
    ) -> Result<HttpResponse, DispatchError> {
        let chain: Arc<[Arc<dyn Middleware>]> = self.queue.iter().map(Arc::clone).collect();
        Next::new(chain, Arc::new(next)).run(request)
    }
}

/// Terminal continuation of a top-level pipeline. Reaching it means no
/// stage produced a response.
struct Exhausted;

impl Continuation for Exhausted {
    fn proceed(&self, _request: &mut HttpRequest) -> Result<HttpResponse, DispatchError> {
        Err(DispatchError::EmptyPipeline)
    }
}
