//! # Middleware Module
//!
//! The request pipeline. A request flows through an ordered chain of
//! [`Middleware`] stages; each stage may short-circuit with its own
//! response, delegate to the rest of the chain through its [`Next`] cursor
//! exactly once, and post-process the response on the way back out.
//!
//! The chain is terminated by [`RequestHandler`], which invokes the handler
//! the router resolved. [`MiddlewarePipeline`] itself implements
//! [`Middleware`], so pipelines nest.

mod core;
mod open_api;
mod pipeline;
mod request_handler;

pub use self::core::{middleware_fn, Continuation, FnMiddleware, Middleware, Next};
pub use open_api::{OpenApiMiddleware, ValidationOptions};
pub use pipeline::MiddlewarePipeline;
pub use request_handler::RequestHandler;
