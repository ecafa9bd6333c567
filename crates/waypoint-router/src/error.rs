//! Error types for routing.

use thiserror::Error;

/// Boxed error returned by handlers.
///
/// Any `std::error::Error + Send + Sync` converts into it, so handlers can use
/// `?` on their own fallible calls.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The pattern has no `METHOD ` prefix.
    #[error("route pattern `{0}` must start with a method, e.g. `GET /path`")]
    MissingMethod(String),

    /// The method token is not a known verb or macro.
    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    /// A `:` parameter segment without a name.
    #[error("parameters must be registered with a name: {0}")]
    UnnamedParam(String),

    /// A `**`, `.**` or `.*` glob appeared before the final segment.
    #[error("glob `{glob}` is only allowed as the final segment: {pattern}")]
    MisplacedGlob { pattern: String, glob: String },

    /// The route resolves to the same leaf as an existing registration.
    #[error("route `{new}` collides with previously registered route `{existing}`")]
    Collision { existing: String, new: String },

    /// A catcher failed while handling another error.
    #[error("catcher failed: {0}")]
    Catcher(#[source] BoxError),
}

/// Errors raised by the dispatch engine itself.
///
/// These never reach the caller of `respond` directly: they are stored on the
/// context and handed to the catcher phase like any handler error.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
