//! Route registry and composition.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RouterConfig;
use crate::context::Phase;
use crate::error::{Result, RouterError};
use crate::handler::{Handler, IntoPipeline, Pipeline};
use crate::headers::Headers;
use crate::pattern::{self, ParamSpec, SplitUrl};
use crate::request::{path_segments, Method, PathParams};
use crate::tree::Tree;

/// A registered pipeline at one trie leaf.
pub struct RouteEntry<S = ()> {
    method: Method,
    pattern: String,
    segments: Vec<String>,
    pipeline: Pipeline<S>,
    params: BTreeMap<usize, ParamSpec>,
}

impl<S> RouteEntry<S> {
    fn new(url: SplitUrl, pipeline: Pipeline<S>) -> Self {
        Self {
            method: url.method,
            pattern: url.pattern,
            segments: url.segments,
            pipeline,
            params: url.params,
        }
    }

    /// The concrete method this entry is registered under.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The pattern as registered, e.g. `GET /users/:id`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Canonical trie key.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The handlers run for this entry.
    pub fn pipeline(&self) -> &Pipeline<S> {
        &self.pipeline
    }

    /// Extracts this route's named parameters from request segments.
    pub fn params_for(&self, segments: &[&str]) -> PathParams {
        let mut params = PathParams::new();
        for spec in self.params.values() {
            if let Some(value) = segments.get(spec.index) {
                params.insert(spec.name.clone(), *value);
            }
        }
        params
    }
}

impl<S> fmt::Debug for RouteEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("segments", &self.segments)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// Per-registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Replace a colliding registration instead of failing. Unset means no.
    pub overwrite: Option<bool>,
}

impl RouteOptions {
    /// Options that allow replacing an existing route.
    pub fn replacing() -> Self {
        Self {
            overwrite: Some(true),
        }
    }

    /// Whether a colliding registration may be replaced.
    pub fn allows_overwrite(&self) -> bool {
        self.overwrite.unwrap_or(false)
    }

    /// Returns these options with unset fields taken from `base`.
    #[must_use]
    pub fn merged_over(self, base: RouteOptions) -> Self {
        Self {
            overwrite: self.overwrite.or(base.overwrite),
        }
    }
}

/// One call to a registration method, kept for [`Router::append`].
pub struct Registration<S = ()> {
    pub phase: Phase,
    pub urls: Vec<String>,
    pub pipeline: Pipeline<S>,
    pub options: RouteOptions,
}

impl<S> Clone for Registration<S> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            urls: self.urls.clone(),
            pipeline: self.pipeline.clone(),
            options: self.options,
        }
    }
}

impl<S> fmt::Debug for Registration<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("phase", &self.phase)
            .field("urls", &self.urls)
            .field("pipeline", &self.pipeline)
            .field("options", &self.options)
            .finish()
    }
}

/// One pattern or a list of patterns.
pub trait IntoPatterns {
    fn into_patterns(self) -> Vec<String>;
}

impl IntoPatterns for &str {
    fn into_patterns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoPatterns for String {
    fn into_patterns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoPatterns for &[&str] {
    fn into_patterns(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_string()).collect()
    }
}

impl<const N: usize> IntoPatterns for [&str; N] {
    fn into_patterns(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_string()).collect()
    }
}

impl IntoPatterns for Vec<&str> {
    fn into_patterns(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoPatterns for Vec<String> {
    fn into_patterns(self) -> Vec<String> {
        self
    }
}

type MethodTable<S> = [Tree<RouteEntry<S>>; 7];

/// The router.
///
/// Routes are registered per phase with the builder methods, then requests
/// are served with [`Router::respond`]. Registration needs ownership or
/// `&mut`, so a router shared behind an `Arc` is immutable while it serves.
///
/// ```ignore
/// let router = Router::new()
///     .hook("*", log_request)?
///     .filter("CRUD /admin/.**", require_login)?
///     .handle("GET /users/:id", show_user)?
///     .catch("ALL /.**", render_error)?;
/// ```
pub struct Router<S = ()> {
    tables: [MethodTable<S>; 6],
    config: RouterConfig,
    default_headers: Headers,
    pub(crate) default_fallback: Option<Arc<dyn Handler<S>>>,
    pub(crate) default_catcher: Option<Arc<dyn Handler<S>>>,
    history: Vec<Registration<S>>,
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Router<S> {
    /// Creates a router with every phase enabled.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a router from a configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            tables: std::array::from_fn(|_| std::array::from_fn(|_| Tree::new())),
            default_headers: config.headers(),
            config,
            default_fallback: None,
            default_catcher: None,
            history: Vec::new(),
        }
    }

    /// Returns the router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub(crate) fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Adds a header every request context starts with.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.default_headers.append(name.clone(), value.clone());
        self.config.default_headers.push((name, value));
        self
    }

    /// Sets the handler run when no handler or fallback produced a response.
    #[must_use]
    pub fn default_fallback(mut self, h: impl Handler<S> + 'static) -> Self {
        self.default_fallback = Some(Arc::new(h));
        self
    }

    /// Sets the handler run for errors no matched catcher answered.
    #[must_use]
    pub fn default_catcher(mut self, h: impl Handler<S> + 'static) -> Self {
        self.default_catcher = Some(Arc::new(h));
        self
    }

    /// Registers a pre-processing hook. Hook results never become the response.
    pub fn hook<M>(self, urls: impl IntoPatterns, pipeline: impl IntoPipeline<S, M>) -> Result<Self> {
        self.on(Phase::Hook, urls, pipeline, RouteOptions::default())
    }

    /// Registers a filter, which may answer the request before its handlers.
    pub fn filter<M>(self, urls: impl IntoPatterns, pipeline: impl IntoPipeline<S, M>) -> Result<Self> {
        self.on(Phase::Filter, urls, pipeline, RouteOptions::default())
    }

    /// Registers a primary handler.
    pub fn handle<M>(self, urls: impl IntoPatterns, pipeline: impl IntoPipeline<S, M>) -> Result<Self> {
        self.on(Phase::Handler, urls, pipeline, RouteOptions::default())
    }

    /// Registers a not-found fallback.
    pub fn fallback<M>(self, urls: impl IntoPatterns, pipeline: impl IntoPipeline<S, M>) -> Result<Self> {
        self.on(Phase::Fallback, urls, pipeline, RouteOptions::default())
    }

    /// Registers an error catcher.
    pub fn catch<M>(self, urls: impl IntoPatterns, pipeline: impl IntoPipeline<S, M>) -> Result<Self> {
        self.on(Phase::Catcher, urls, pipeline, RouteOptions::default())
    }

    /// Registers a post-processing handler, run on the success path only.
    pub fn after<M>(self, urls: impl IntoPatterns, pipeline: impl IntoPipeline<S, M>) -> Result<Self> {
        self.on(Phase::After, urls, pipeline, RouteOptions::default())
    }

    /// Registers a pipeline under any phase, with options.
    pub fn on<M>(
        mut self,
        phase: Phase,
        urls: impl IntoPatterns,
        pipeline: impl IntoPipeline<S, M>,
        options: RouteOptions,
    ) -> Result<Self> {
        self.register(phase, urls, pipeline, options)?;
        Ok(self)
    }

    /// Registers a pipeline through a mutable reference.
    ///
    /// Every pattern is compiled and checked before the first one is
    /// inserted, so a failed call leaves the router unchanged.
    pub fn register<M>(
        &mut self,
        phase: Phase,
        urls: impl IntoPatterns,
        pipeline: impl IntoPipeline<S, M>,
        options: RouteOptions,
    ) -> Result<&mut Self> {
        let urls = urls.into_patterns();
        let pipeline = pipeline.into_pipeline();
        let splits = pattern::split_urls(&urls)?;

        for split in &splits {
            pattern::check_canonical(&split.pattern, &split.segments)?;
        }
        if !options.allows_overwrite() {
            self.check_collisions(phase, &splits)?;
        }

        let table = &mut self.tables[phase.index()];
        for split in splits {
            debug!(%phase, method = %split.method, pattern = %split.pattern, "registering route");
            let tree = &mut table[split.method.index()];
            let segments = split.segments.clone();
            if let Some(old) = tree.set(&segments, RouteEntry::new(split, pipeline.clone())) {
                debug!(%phase, pattern = %old.pattern, "replaced route");
            }
        }

        self.history.push(Registration {
            phase,
            urls,
            pipeline,
            options,
        });
        Ok(self)
    }

    /// Rejects registrations landing on an occupied leaf, including leaves
    /// claimed earlier in the same batch.
    fn check_collisions(&self, phase: Phase, splits: &[SplitUrl]) -> Result<()> {
        let table = &self.tables[phase.index()];
        for (i, split) in splits.iter().enumerate() {
            let existing = table[split.method.index()]
                .get(&split.segments)
                .filter(|entry| collides(&entry.segments, &split.segments))
                .map(|entry| entry.pattern.as_str())
                .or_else(|| {
                    splits[..i]
                        .iter()
                        .find(|prev| {
                            prev.method == split.method && prev.leaf_key() == split.leaf_key()
                        })
                        .map(|prev| prev.pattern.as_str())
                });

            if let Some(existing) = existing {
                return Err(RouterError::Collision {
                    existing: existing.to_string(),
                    new: split.pattern.clone(),
                });
            }
        }
        Ok(())
    }

    /// Replays every registration of `other` with its paths mounted under
    /// `base`.
    pub fn append(self, base: &str, other: &Router<S>) -> Result<Self> {
        self.append_with(base, other, RouteOptions::default())
    }

    /// Like [`Router::append`], with `options` overriding each replayed
    /// registration's own options.
    pub fn append_with(mut self, base: &str, other: &Router<S>, options: RouteOptions) -> Result<Self> {
        for record in &other.history {
            let urls = record
                .urls
                .iter()
                .map(|url| pattern::with_base(url, base))
                .collect::<Result<Vec<_>>>()?;
            self.register(
                record.phase,
                urls,
                record.pipeline.clone(),
                options.merged_over(record.options),
            )?;
        }
        Ok(self)
    }

    /// Registrations in the order they were made.
    pub fn registrations(&self) -> &[Registration<S>] {
        &self.history
    }

    /// Every registered `(phase, pattern)` pair, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Phase, &str)> {
        self.history
            .iter()
            .flat_map(|r| r.urls.iter().map(move |u| (r.phase, u.as_str())))
    }

    /// Returns the routes of `phase` matching `method` and `path`, most
    /// specific first. Disabled phases match nothing.
    pub fn lookup(&self, phase: Phase, method: Method, path: &str) -> Vec<&RouteEntry<S>> {
        self.lookup_segments(phase, method, &path_segments(path))
    }

    pub(crate) fn lookup_segments(
        &self,
        phase: Phase,
        method: Method,
        segments: &[&str],
    ) -> Vec<&RouteEntry<S>> {
        if !self.config.enabled(phase) {
            return Vec::new();
        }
        self.tables[phase.index()][method.index()].get_all(segments)
    }
}

/// Whether two canonical keys resolve to the same leaf.
///
/// Compared from the tail: segments collide when equal, or when the existing
/// one is a wildcard and the new one is a wildcard too.
fn collides(existing: &[String], new: &[String]) -> bool {
    let existing = pattern::leaf_key(existing);
    let new = pattern::leaf_key(new);
    existing.len() == new.len()
        && existing
            .iter()
            .rev()
            .zip(new.iter().rev())
            .all(|(a, b)| a == b)
}
