//! Handler contract and pipelines.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// A boxed future for async handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler returns.
pub type HandlerResult = Result<Outcome, BoxError>;

/// The value a handler resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Continue with the next handler.
    #[default]
    Next,
    /// Stop the remaining handlers of this phase without a response.
    Stop,
    /// Supply a response, which also stops the phase.
    Respond(Response),
}

impl Outcome {
    /// Whether this outcome stops the current phase.
    pub fn is_stop(&self) -> bool {
        !matches!(self, Self::Next)
    }

    /// Returns the response, if one was supplied.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Respond(res) => Some(res),
            _ => None,
        }
    }

    /// Whether this outcome carries a response.
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Respond(_))
    }
}

impl From<Response> for Outcome {
    fn from(res: Response) -> Self {
        Self::Respond(res)
    }
}

impl From<bool> for Outcome {
    fn from(stop: bool) -> Self {
        if stop { Self::Stop } else { Self::Next }
    }
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Next
    }
}

impl From<Option<Response>> for Outcome {
    fn from(res: Option<Response>) -> Self {
        res.map_or(Self::Next, Self::Respond)
    }
}

/// A request handler usable in any phase.
///
/// Handlers receive the request and the mutable per-request context. They are
/// awaited one at a time; the next handler does not start until the current
/// one resolves.
///
/// # Example
///
/// ```ignore
/// struct RequireJson;
///
/// impl<S: Send> Handler<S> for RequireJson {
///     fn call<'a>(&'a self, req: &'a Request, _ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             match req.get_header("content-type") {
///                 Some("application/json") => Ok(Outcome::Next),
///                 _ => Ok(Response::new(415).into()),
///             }
///         })
///     }
/// }
/// ```
pub trait Handler<S = ()>: Send + Sync {
    /// Handles one request.
    fn call<'a>(&'a self, req: &'a Request, ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult>;
}

impl<S, F> Handler<S> for F
where
    F: for<'a> Fn(&'a Request, &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    fn call<'a>(&'a self, req: &'a Request, ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        self(req, ctx)
    }
}

/// Pins a closure's signature so it can be used as a [`Handler`].
///
/// ```ignore
/// let greet = handler(|_req, ctx: &mut Context| Box::pin(async move {
///     let name = ctx.param("name").unwrap_or("world");
///     Ok(Response::text(format!("Hello, {name}!")).into())
/// }));
/// ```
pub fn handler<S, F>(f: F) -> F
where
    F: for<'a> Fn(&'a Request, &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    f
}

/// A handler that always responds with a clone of the given response.
#[derive(Debug, Clone)]
pub struct Fixed(pub Response);

impl<S: Send> Handler<S> for Fixed {
    fn call<'a>(&'a self, _req: &'a Request, _ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        let res = self.0.clone();
        Box::pin(async move { Ok(Outcome::Respond(res)) })
    }
}

/// An ordered list of handlers registered together.
pub struct Pipeline<S = ()> {
    handlers: Vec<Arc<dyn Handler<S>>>,
}

impl<S> Pipeline<S> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler.
    #[must_use]
    pub fn then(mut self, h: impl Handler<S> + 'static) -> Self {
        self.handlers.push(Arc::new(h));
        self
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if the pipeline has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn Handler<S>>> {
        self.handlers.iter()
    }
}

impl<S> Default for Pipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Pipeline<S> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<S> fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("len", &self.handlers.len())
            .finish()
    }
}

/// Anything that can be registered as a pipeline: a single handler or a
/// [`Pipeline`].
///
/// `M` only tells the two impls apart and is always inferred.
pub trait IntoPipeline<S, M> {
    /// Converts into a pipeline.
    fn into_pipeline(self) -> Pipeline<S>;
}

/// [`IntoPipeline`] marker for a single handler.
#[derive(Debug)]
pub enum SingleHandler {}

/// [`IntoPipeline`] marker for a ready-made [`Pipeline`].
#[derive(Debug)]
pub enum HandlerList {}

impl<S> IntoPipeline<S, HandlerList> for Pipeline<S> {
    fn into_pipeline(self) -> Pipeline<S> {
        self
    }
}

impl<S, H: Handler<S> + 'static> IntoPipeline<S, SingleHandler> for H {
    fn into_pipeline(self) -> Pipeline<S> {
        Pipeline::new().then(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextSeed;
    use crate::context::Found;
    use crate::headers::Headers;

    fn ctx() -> Context {
        ContextSeed::default().build(&Headers::new(), Found::default())
    }

    #[test]
    fn test_outcome_conversions() {
        assert_eq!(Outcome::from(true), Outcome::Stop);
        assert_eq!(Outcome::from(false), Outcome::Next);
        assert_eq!(Outcome::from(()), Outcome::Next);
        assert_eq!(Outcome::from(None), Outcome::Next);
        assert!(Outcome::from(Response::ok()).is_response());
        assert!(Outcome::Stop.is_stop());
        assert!(!Outcome::Next.is_stop());
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let h = handler(|req: &Request, ctx: &mut Context| {
            Box::pin(async move {
                ctx.headers.set("X-Path", req.path.clone());
                Ok(Outcome::Stop)
            })
        });

        let req = Request::get("/hello");
        let mut ctx = ctx();
        let out = Handler::call(&h, &req, &mut ctx).await.unwrap();
        assert_eq!(out, Outcome::Stop);
        assert_eq!(ctx.headers.get("x-path"), Some("/hello"));
    }

    #[tokio::test]
    async fn test_fixed_handler() {
        let h = Fixed(Response::text("hi"));
        let req = Request::get("/");
        let mut ctx = ctx();
        let out = Handler::<()>::call(&h, &req, &mut ctx).await.unwrap();
        assert_eq!(out.into_response().and_then(|r| r.body_string()), Some("hi".to_string()));
    }

    #[test]
    fn test_pipeline_building() {
        let p: Pipeline = Pipeline::new().then(Fixed(Response::ok())).then(Fixed(Response::ok()));
        assert_eq!(p.len(), 2);
        assert_eq!(p.clone().len(), 2);
        let single: Pipeline = Fixed(Response::ok()).into_pipeline();
        assert_eq!(single.len(), 1);
        let same: Pipeline = p.into_pipeline();
        assert_eq!(same.len(), 2);
    }
}
