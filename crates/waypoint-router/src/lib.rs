//! # waypoint-router
//!
//! An in-process HTTP request router with phased handler dispatch.
//!
//! This crate provides:
//! - A segment trie matching literals, `:named` parameters, `*`, `**` and the
//!   `.*`/`.**` current-path globs, most specific route first
//! - Six handler phases: hooks, filters, handlers, fallbacks, catchers and
//!   afters
//! - Collision detection at registration time
//! - Router composition under a base path
//!
//! It does no I/O: it takes an already-parsed [`Request`] and returns a
//! [`Response`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use waypoint_router::{handler, Context, Outcome, Request, Response, Router};
//!
//! let show_user = handler(|_req: &Request, ctx: &mut Context| Box::pin(async move {
//!     let id = ctx.param("id").unwrap_or("unknown");
//!     Ok(Outcome::Respond(Response::json(&serde_json::json!({ "id": id }))))
//! }));
//!
//! let router = Router::new()
//!     .handle("GET /users/:id", show_user)?;
//!
//! let response = router.respond(&Request::get("/users/123")).await?;
//! ```
//!
//! ## Phases
//!
//! For each request the router runs, in order:
//!
//! 1. **hooks**: side effects only, their results are discarded
//! 2. **filters**: may answer the request early
//! 3. **handlers**: skipped when a filter answered
//! 4. **fallbacks**: run when nothing answered yet, then the default fallback
//! 5. **afters**: run once the response is final, on the success path only
//!
//! Any error or panic in those phases skips the rest, afters included, and
//! runs the **catchers** instead.
//!
//! A handler resolves to an [`Outcome`]: `Next` continues, `Stop` ends the
//! current phase, and `Respond` ends it with a response.
//!
//! ## Patterns
//!
//! ```ignore
//! router
//!     .hook("*", log_request)?                         // every method and path
//!     .filter("CRUD /admin/.**", require_login)?       // /admin and below
//!     .handle(["GET /users/:id", "HEAD /users/:id"], show_user)?
//!     .handle("GET /users/me", show_me)?               // beats /users/:id
//!     .fallback("GET /docs/**", docs_index)?           // /docs/a, /docs/a/b
//!     .catch("ALL /.**", render_error)?;
//! ```
//!
//! ## Composition
//!
//! ```ignore
//! let api = Router::new().handle("GET /users", list_users)?;
//! let router = Router::new().append("/api/v1", &api)?;
//! ```

mod config;
mod context;
mod dispatch;
mod error;
mod handler;
mod headers;
mod pattern;
mod request;
mod response;
mod router;
mod tree;

pub use config::RouterConfig;
pub use context::{Context, ContextSeed, Found, Phase};
pub use error::{BoxError, DispatchError, Result, RouterError};
pub use handler::{
    handler, BoxFuture, Fixed, Handler, HandlerList, HandlerResult, IntoPipeline, Outcome,
    Pipeline, SingleHandler,
};
pub use headers::Headers;
pub use pattern::{split_url, split_urls, ParamSpec, SplitUrl};
pub use request::{Method, PathParams, Request};
pub use response::Response;
pub use router::{IntoPatterns, Registration, RouteEntry, RouteOptions, Router};
pub use tree::Tree;
