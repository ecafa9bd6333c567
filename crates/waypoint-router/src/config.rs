//! Router configuration.

use serde::{Deserialize, Serialize};

use crate::context::Phase;
use crate::headers::Headers;

/// Router settings.
///
/// Every phase except the handler phase can be switched off; a disabled
/// phase is skipped during lookup, so its routes count as not found.
///
/// # Example
///
/// ```
/// use waypoint_router::RouterConfig;
///
/// let config = RouterConfig::from_json(r#"{
///     "catchers": false,
///     "default_headers": [["X-Powered-By", "waypoint"]]
/// }"#).unwrap();
/// assert!(config.hooks);
/// assert!(!config.catchers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub hooks: bool,
    pub filters: bool,
    pub fallbacks: bool,
    pub catchers: bool,
    pub afters: bool,
    /// Headers every context starts with, in order.
    pub default_headers: Vec<(String, String)>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            hooks: true,
            filters: true,
            fallbacks: true,
            catchers: true,
            afters: true,
            default_headers: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether routes of `phase` are looked up.
    pub fn enabled(&self, phase: Phase) -> bool {
        match phase {
            Phase::Hook => self.hooks,
            Phase::Filter => self.filters,
            Phase::Handler => true,
            Phase::Fallback => self.fallbacks,
            Phase::Catcher => self.catchers,
            Phase::After => self.afters,
        }
    }

    pub(crate) fn headers(&self) -> Headers {
        self.default_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}
