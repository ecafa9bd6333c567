//! Request dispatch.
//!
//! One call to [`Router::respond`] runs the phases in a fixed order:
//!
//! ```text
//! hooks -> filters -> handlers -> fallbacks -> finalize -> afters
//!    \________________________________________________________/
//!                              | error or panic
//!                              v
//!                          catchers
//! ```
//!
//! Within a phase every matched route runs, most specific first, and every
//! handler of each route's pipeline runs in order, until one handler returns
//! [`Outcome::Stop`] or [`Outcome::Respond`].

use std::any::Any;
use std::ops::Index;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, trace, warn};

use crate::context::{Context, ContextSeed, Found, Phase};
use crate::error::{BoxError, DispatchError, Result, RouterError};
use crate::handler::{HandlerResult, Outcome};
use crate::request::{Method, Request};
use crate::response::Response;
use crate::router::{RouteEntry, Router};

/// Matched routes per phase for one request.
struct Matches<'r, S> {
    phases: [Vec<&'r RouteEntry<S>>; 6],
}

impl<'r, S> Matches<'r, S> {
    fn lookup(router: &'r Router<S>, method: Method, segments: &[&str]) -> Self {
        Self {
            phases: Phase::ALL.map(|phase| router.lookup_segments(phase, method, segments)),
        }
    }

    fn found(&self) -> Found {
        let mut found = Found::default();
        for phase in Phase::ALL {
            found.set(phase, !self[phase].is_empty());
        }
        found
    }
}

impl<'r, S> Index<Phase> for Matches<'r, S> {
    type Output = [&'r RouteEntry<S>];

    fn index(&self, phase: Phase) -> &Self::Output {
        &self.phases[phase.index()]
    }
}

impl<S: Send> Router<S> {
    /// Dispatches one request with a fresh context.
    ///
    /// Ordinary failures become responses: `405` for an unsupported method,
    /// `404` when nothing matched, `204` when a matched route produced no
    /// response, and catcher output (or `500`) for handler errors and panics.
    /// The only `Err` is [`RouterError::Catcher`], when a catcher itself fails.
    pub async fn respond(&self, req: &Request) -> Result<Response>
    where
        S: Default,
    {
        self.respond_with(req, ContextSeed::default()).await
    }

    /// Dispatches one request, starting from a caller-supplied partial
    /// context.
    pub async fn respond_with(&self, req: &Request, seed: ContextSeed<S>) -> Result<Response> {
        let Some(method) = Method::from_str(&req.method) else {
            debug!(method = %req.method, path = %req.path, "unsupported method");
            return Ok(Response::method_not_allowed());
        };

        let segments = req.segments();
        let matches = Matches::lookup(self, method, &segments);
        let mut ctx = seed.build(self.default_headers(), matches.found());
        debug!(%method, path = %req.path, found = ?ctx.found, "dispatching request");

        let run = AssertUnwindSafe(self.run(req, &mut ctx, &matches, &segments))
            .catch_unwind()
            .await;
        let err: BoxError = match run {
            Ok(Ok(res)) => {
                debug!(status = res.status, "request completed");
                return Ok(res);
            }
            Ok(Err(err)) => err,
            Err(panic) => Box::new(DispatchError::Panicked(panic_message(&*panic))),
        };

        warn!(%method, path = %req.path, error = %err, "request failed");
        ctx.error = Some(err);
        let res = self.run_catchers(req, &mut ctx, &matches, &segments).await?;
        debug!(status = res.status, "request completed after error");
        Ok(res)
    }

    /// The success path: every phase but the catchers.
    async fn run(
        &self,
        req: &Request,
        ctx: &mut Context<S>,
        matches: &Matches<'_, S>,
        segments: &[&str],
    ) -> std::result::Result<Response, BoxError> {
        run_phase(Phase::Hook, &matches[Phase::Hook], req, ctx, segments).await?;

        let mut candidate = run_phase(Phase::Filter, &matches[Phase::Filter], req, ctx, segments).await?;
        if !candidate.is_response() {
            candidate = run_phase(Phase::Handler, &matches[Phase::Handler], req, ctx, segments).await?;
        }
        if !candidate.is_response() {
            candidate =
                run_phase(Phase::Fallback, &matches[Phase::Fallback], req, ctx, segments).await?;
        }
        if !candidate.is_response() {
            if let Some(fallback) = &self.default_fallback {
                trace!("running default fallback");
                candidate = fallback.call(req, ctx).await?;
            }
        }

        let mut res = match candidate {
            Outcome::Respond(res) => res,
            _ if ctx.found.routed() => Response::no_content(),
            _ => Response::not_found(),
        };
        res.headers.merge(&ctx.headers);
        ctx.response = Some(res.clone());

        // Afters may edit the response in place but cannot remove it.
        run_phase(Phase::After, &matches[Phase::After], req, ctx, segments).await?;
        Ok(ctx.response.take().unwrap_or(res))
    }

    /// The error path. Afters never run here.
    async fn run_catchers(
        &self,
        req: &Request,
        ctx: &mut Context<S>,
        matches: &Matches<'_, S>,
        segments: &[&str],
    ) -> Result<Response> {
        let outcome = run_phase(Phase::Catcher, &matches[Phase::Catcher], req, ctx, segments)
            .await
            .map_err(RouterError::Catcher)?;
        if let Outcome::Respond(res) = outcome {
            return Ok(res);
        }

        if let Some(catcher) = &self.default_catcher {
            trace!("running default catcher");
            let outcome = catcher.call(req, ctx).await.map_err(RouterError::Catcher)?;
            if let Outcome::Respond(res) = outcome {
                return Ok(res);
            }
        }
        Ok(Response::internal_server_error())
    }
}

/// Runs the pipelines of every matched route of one phase.
///
/// The most specific route's parameters are copied into the context first.
/// Returns the first stopping outcome, or [`Outcome::Next`].
async fn run_phase<S>(
    phase: Phase,
    entries: &[&RouteEntry<S>],
    req: &Request,
    ctx: &mut Context<S>,
    segments: &[&str],
) -> HandlerResult {
    let Some(first) = entries.first() else {
        return Ok(Outcome::Next);
    };
    ctx.params.extend(first.params_for(segments));
    trace!(%phase, routes = entries.len(), pattern = first.pattern(), "running phase");

    for entry in entries {
        for h in entry.pipeline().iter() {
            let outcome = h.call(req, ctx).await?;
            if outcome.is_stop() {
                trace!(%phase, pattern = entry.pattern(), "phase stopped");
                return Ok(outcome);
            }
        }
    }
    Ok(Outcome::Next)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
