//! Gateway route-table extraction.
//!
//! The gateway layer is a declarative table, so this is the simplest
//! extractor: the routes are already templates. Two shapes are accepted,
//! YAML or JSON chosen by file extension:
//!
//! ```yaml
//! routes:
//!   - method: GET
//!     path: /orgs/{orgId}
//!     handler: get_org
//!   - method: POST
//!     path: /webhooks/stripe
//!     documented: true   # intentionally UI-less, feeds the orphan detector
//! ```
//!
//! or a mapping of path template to accepted methods:
//!
//! ```yaml
//! paths:
//!   /orgs/{orgId}: [GET, PUT, DELETE]
//! ```
//!
//! A live infrastructure query that yields the same shape is just another
//! source of the same records; the core only ever sees the table.

use crate::index::RouteKey;
use crate::normalize::{normalize, template_params};
use crate::record::{parse_method, RouteRecord};
use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct GatewayDoc {
    #[serde(default)]
    routes: Vec<GatewayEntry>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GatewayEntry {
    method: String,
    path: String,
    #[serde(default)]
    handler: Option<String>,
    #[serde(default)]
    documented: bool,
}

/// The extracted gateway layer: route records plus the set of routes the
/// table marks as intentionally UI-less.
#[derive(Debug, Clone, Default)]
pub struct GatewayRoutes {
    pub records: Vec<RouteRecord>,
    pub documented: HashSet<RouteKey>,
}

/// Read a declarative gateway route table.
///
/// Unreadable or unparseable tables are structural errors: a missing gateway
/// layer would manufacture a flood of false `route_not_found` findings, so
/// the run aborts instead.
pub fn extract_gateway_routes(file: &Path) -> anyhow::Result<GatewayRoutes> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read gateway route table {}", file.display()))?;
    let is_yaml = file
        .extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false);
    let doc: GatewayDoc = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid gateway route table {}", file.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid gateway route table {}", file.display()))?
    };

    let mut out = GatewayRoutes::default();

    for entry in &doc.routes {
        let Some(method) = parse_method(&entry.method) else {
            warn!(
                file = %file.display(),
                method = %entry.method,
                path = %entry.path,
                "Skipping gateway entry with unknown HTTP method"
            );
            continue;
        };
        let line = line_of_needle(&content, &entry.path);
        let mut record = RouteRecord::new(
            file,
            line,
            method.clone(),
            entry.path.clone(),
            format!("{} {}", entry.method.to_ascii_uppercase(), entry.path),
        );
        record.path_params = template_params(&entry.path);
        record.handler_name = entry.handler.clone();
        if entry.documented {
            out.documented.insert((method, normalize(&entry.path)));
        }
        out.records.push(record);
    }

    for (path, methods) in &doc.paths {
        let line = line_of_needle(&content, path);
        for m in methods {
            let Some(method) = parse_method(m) else {
                warn!(
                    file = %file.display(),
                    method = %m,
                    path = %path,
                    "Skipping gateway entry with unknown HTTP method"
                );
                continue;
            };
            let mut record = RouteRecord::new(
                file,
                line,
                method,
                path.clone(),
                format!("{} {}", m.to_ascii_uppercase(), path),
            );
            record.path_params = template_params(path);
            out.records.push(record);
        }
    }

    Ok(out)
}

/// Best-effort line attribution: first line containing the path text.
fn line_of_needle(content: &str, needle: &str) -> usize {
    content
        .lines()
        .position(|l| l.contains(needle))
        .map(|i| i + 1)
        .unwrap_or(1)
}
