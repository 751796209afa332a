//! Validation configuration file.
//!
//! Loaded once per run from `apidrift.yaml` (or JSON); everything is
//! optional:
//!
//! ```yaml
//! # Suppress orphan findings for matching canonical paths
//! exclusions:
//!   - "^/internal/"
//!   - "^/webhooks/"
//! # Routes intentionally UI-less, as "METHOD /path" entries
//! documented:
//!   - POST /webhooks/stripe
//! # Restrict scanning to a subtree of each layer root
//! scope: src
//! ```

use crate::index::RouteKey;
use crate::normalize::normalize;
use crate::record::parse_method;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Configuration consumed by the core: exclusion patterns, documented
/// routes, and a subtree scope filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Ordered exclusion expressions over canonical paths
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// `METHOD /path` entries declared intentionally UI-less
    #[serde(default)]
    pub documented: Vec<String>,
    /// Subtree filter applied relative to each layer root
    #[serde(default)]
    pub scope: Option<String>,
}

impl ValidationConfig {
    /// Load a configuration file, YAML or JSON by extension.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let is_yaml = path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(true);
        let config: ValidationConfig = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?
        };
        Ok(config)
    }

    /// Parse `documented:` entries into route keys. Malformed entries are
    /// skipped with a warning; they only widen orphan reporting, never
    /// corrupt it.
    #[must_use]
    pub fn documented_keys(&self) -> HashSet<RouteKey> {
        let mut keys = HashSet::new();
        for entry in &self.documented {
            let mut parts = entry.split_whitespace();
            let method = parts.next().and_then(parse_method);
            let path = parts.next();
            match (method, path) {
                (Some(method), Some(path)) => {
                    keys.insert((method, normalize(path)));
                }
                _ => {
                    warn!(entry = %entry, "Skipping malformed documented route (want 'METHOD /path')");
                }
            }
        }
        keys
    }
}
