//! Per-request context.

use std::fmt;

use crate::error::BoxError;
use crate::headers::Headers;
use crate::request::PathParams;
use crate::response::Response;

/// Handler phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs first; can never supply the response.
    Hook,
    /// Validates the request; may short-circuit with a response.
    Filter,
    /// Primary route handlers.
    Handler,
    /// Runs when nothing produced a response.
    Fallback,
    /// Turns an error into a response.
    Catcher,
    /// Runs after the response is finalized, on success only.
    After,
}

impl Phase {
    /// Every phase, in table order.
    pub const ALL: [Phase; 6] = [
        Self::Hook,
        Self::Filter,
        Self::Handler,
        Self::Fallback,
        Self::Catcher,
        Self::After,
    ];

    /// Returns the phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hook => "hook",
            Self::Filter => "filter",
            Self::Handler => "handler",
            Self::Fallback => "fallback",
            Self::Catcher => "catcher",
            Self::After => "after",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether any route existed, per phase, for the request's method and path.
///
/// This records route existence only, not whether a handler produced output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Found {
    pub hook: bool,
    pub filter: bool,
    pub handler: bool,
    pub fallback: bool,
    pub catcher: bool,
    pub after: bool,
}

impl Found {
    pub(crate) fn set(&mut self, phase: Phase, found: bool) {
        let slot = match phase {
            Phase::Hook => &mut self.hook,
            Phase::Filter => &mut self.filter,
            Phase::Handler => &mut self.handler,
            Phase::Fallback => &mut self.fallback,
            Phase::Catcher => &mut self.catcher,
            Phase::After => &mut self.after,
        };
        *slot = found;
    }

    /// Whether a handler or fallback route matched.
    pub fn routed(&self) -> bool {
        self.handler || self.fallback
    }
}

/// State carried through one call to `respond`.
///
/// `S` is an application-defined slot for whatever collaborators attach to
/// the request (parsed body, session, authenticated user, ...).
pub struct Context<S = ()> {
    /// Path parameters of the most specific matched route.
    pub params: PathParams,
    /// Headers merged onto the final response, overriding its own.
    pub headers: Headers,
    /// The finalized response, once there is one.
    pub response: Option<Response>,
    /// The error being handled, during the catcher phase.
    pub error: Option<BoxError>,
    /// Route existence per phase.
    pub found: Found,
    /// Application state.
    pub state: S,
}

impl<S> Context<S> {
    /// Returns a path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

impl<S: fmt::Debug> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("response", &self.response)
            .field("error", &self.error.as_ref().map(ToString::to_string))
            .field("found", &self.found)
            .field("state", &self.state)
            .finish()
    }
}

/// Caller-supplied partial context for [`crate::Router::respond_with`].
///
/// Fields left as `None` take the router's defaults.
#[derive(Debug, Default)]
pub struct ContextSeed<S = ()> {
    /// Initial parameters; route parameters are copied over them.
    pub params: Option<PathParams>,
    /// Replaces the router's default headers.
    pub headers: Option<Headers>,
    /// Application state.
    pub state: S,
}

impl<S> ContextSeed<S> {
    /// A seed carrying only application state.
    pub fn state(state: S) -> Self {
        Self {
            params: None,
            headers: None,
            state,
        }
    }

    pub(crate) fn build(self, default_headers: &Headers, found: Found) -> Context<S> {
        Context {
            params: self.params.unwrap_or_default(),
            headers: self.headers.unwrap_or_else(|| default_headers.clone()),
            response: None,
            error: None,
            found,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_set() {
        let mut found = Found::default();
        assert!(!found.routed());
        found.set(Phase::Fallback, true);
        assert!(found.fallback);
        assert!(found.routed());
    }

    #[test]
    fn test_phase_order() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
        assert_eq!(Phase::Catcher.to_string(), "catcher");
    }

    #[test]
    fn test_seed_overrides_defaults() {
        let defaults: Headers = [("X-Default", "1")].into_iter().collect();

        let ctx = ContextSeed::state(7u32).build(&defaults, Found::default());
        assert_eq!(ctx.headers.get("x-default"), Some("1"));
        assert_eq!(ctx.state, 7);

        let mut params = PathParams::new();
        params.insert("tenant", "acme");
        let seed = ContextSeed {
            params: Some(params),
            headers: Some(Headers::new()),
            state: (),
        };
        let ctx = seed.build(&defaults, Found::default());
        assert!(ctx.headers.is_empty());
        assert_eq!(ctx.param("tenant"), Some("acme"));
    }
}
