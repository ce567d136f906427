//! Per-call-site adapter configuration.
//!
//! A call site opts into rebinding by carrying a [`crate::CallSiteMarker::Rebind`]
//! marker with [`DispatchOptions`]. Markers can be attached in code, or looked up
//! from an [`AdapterConfig`] document:
//!
//! ```json
//! { "call_sites": { "fetch_user": { "front_of_queue": true }, "list_repos": {} } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CallSiteMarker, CallSiteName, ConfigurationError, DispatchPriority};

/// Options carried by a rebind marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchOptions {
    /// Deliver outcomes ahead of pending ordinary work on the dispatch target.
    #[serde(default)]
    pub front_of_queue: bool,
}

impl DispatchOptions {
    /// Options that submit through the front of the dispatch target's queue.
    pub fn front_of_queue() -> Self {
        Self {
            front_of_queue: true,
        }
    }

    /// The dispatch priority these options select.
    pub fn priority(self) -> DispatchPriority {
        DispatchPriority::from(self.front_of_queue)
    }
}

// ---------------------------------------------------------------------------

/// Mapping from call-site names to the rebind options they carry.
///
/// Call sites absent from the map are not rebound.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Options per configured call site.
    #[serde(default)]
    pub call_sites: BTreeMap<CallSiteName, DispatchOptions>,
}

impl AdapterConfig {
    /// Parses a JSON configuration document.
    ///
    /// Fails on malformed JSON, unknown fields, or an empty call-site name.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidConfig {
                message: e.to_string(),
            })?;

        if config.call_sites.keys().any(|name| name.as_str().is_empty()) {
            return Err(ConfigurationError::EmptyName {
                field: "call_sites",
            });
        }

        tracing::debug!(
            call_sites = config.call_sites.len(),
            "Loaded adapter configuration"
        );
        Ok(config)
    }

    /// Returns the markers configured for `site`: one rebind marker, or none.
    pub fn markers_for(&self, site: &CallSiteName) -> Vec<CallSiteMarker> {
        self.call_sites
            .get(site)
            .map(|options| vec![CallSiteMarker::Rebind(*options)])
            .unwrap_or_default()
    }
}
