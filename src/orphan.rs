//! Orphan detection: handler routes no client ever calls.
//!
//! Orphans are warnings, never errors — an endpoint without a UI caller may
//! be deliberate (webhooks, internal tooling, cron targets). Two suppression
//! channels exist: compiled exclusion patterns over the canonical path, and
//! a documented set of routes explicitly declared elsewhere as intentionally
//! UI-less.

use crate::index::{RouteIndex, RouteKey};
use crate::normalize::CanonicalPath;
use crate::report::{Mismatch, MismatchKind, Severity};
use anyhow::Context;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// A compiled matcher over [`CanonicalPath`], loaded once and constant for
/// the run.
#[derive(Debug, Clone)]
pub struct ExclusionPattern {
    raw: String,
    regex: Regex,
}

impl ExclusionPattern {
    /// Compile one exclusion expression. Invalid expressions are
    /// configuration errors and fail the run before matching starts.
    pub fn compile(pattern: &str) -> anyhow::Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("invalid exclusion pattern '{}'", pattern))?;
        Ok(ExclusionPattern {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// The expression as written in configuration
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn matches(&self, path: &CanonicalPath) -> bool {
        self.regex.is_match(path.as_str())
    }
}

/// Compile an ordered list of exclusion expressions.
pub fn compile_exclusions(patterns: &[String]) -> anyhow::Result<Vec<ExclusionPattern>> {
    patterns
        .iter()
        .map(|p| ExclusionPattern::compile(p))
        .collect()
}

/// Find handler routes with no client caller.
#[must_use]
pub fn detect_orphans(
    handler: &RouteIndex,
    client: &RouteIndex,
    exclusions: &[ExclusionPattern],
    documented: &HashSet<RouteKey>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for ((method, path), records) in handler.iter_sorted() {
        if client.contains(method, path) {
            continue;
        }
        if let Some(pattern) = exclusions.iter().find(|e| e.matches(path)) {
            debug!(
                method = %method,
                path = %path,
                pattern = pattern.as_str(),
                "Orphan suppressed by exclusion pattern"
            );
            continue;
        }
        if documented.contains(&(method.clone(), path.clone())) {
            debug!(method = %method, path = %path, "Orphan documented as intentionally UI-less");
            continue;
        }
        for record in records {
            mismatches.push(
                Mismatch::new(
                    MismatchKind::OrphanedRoute,
                    Severity::Warning,
                    format!("handler implements {} {} but no client ever calls it", method, path),
                )
                .with_location(&record.source_file, record.source_line)
                .with_suggestion(
                    "remove the handler, add an exclusion pattern, or mark the route documented",
                ),
            );
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::record::{Layer, RouteRecord};
    use http::Method;

    fn rec(file: &str, line: usize, method: Method, path: &str) -> RouteRecord {
        RouteRecord::new(file, line, method, path, "")
    }

    fn client_index() -> RouteIndex {
        RouteIndex::build(
            Layer::Client,
            vec![rec("a.ts", 1, Method::GET, "/orgs/${orgId}")],
        )
    }

    #[test]
    fn test_uncalled_handler_route_is_warned() {
        let handler = RouteIndex::build(
            Layer::Handler,
            vec![
                rec("h.py", 1, Method::GET, "/orgs/{orgId}"),
                rec("h.py", 9, Method::POST, "/jobs/retry"),
            ],
        );
        let orphans = detect_orphans(&handler, &client_index(), &[], &HashSet::new());
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].kind, MismatchKind::OrphanedRoute);
        assert_eq!(orphans[0].severity, Severity::Warning);
        assert!(orphans[0].message.contains("/jobs/retry"));
    }

    #[test]
    fn test_exclusion_pattern_suppresses() {
        let handler = RouteIndex::build(
            Layer::Handler,
            vec![rec("h.py", 3, Method::POST, "/internal/reindex")],
        );
        let exclusions = compile_exclusions(&["^/internal/".to_string()]).unwrap();
        let orphans = detect_orphans(&handler, &client_index(), &exclusions, &HashSet::new());
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_documented_route_suppresses() {
        let handler = RouteIndex::build(
            Layer::Handler,
            vec![rec("h.py", 3, Method::POST, "/webhooks/stripe")],
        );
        let documented: HashSet<RouteKey> =
            [(Method::POST, normalize("/webhooks/stripe"))].into_iter().collect();
        let orphans = detect_orphans(&handler, &client_index(), &[], &documented);
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_invalid_exclusion_is_fatal() {
        assert!(compile_exclusions(&["([".to_string()]).is_err());
    }

    #[test]
    fn test_every_orphan_record_is_reported() {
        let handler = RouteIndex::build(
            Layer::Handler,
            vec![
                rec("h.py", 2, Method::GET, "/stats"),
                rec("other.py", 8, Method::GET, "/stats"),
            ],
        );
        let orphans = detect_orphans(&handler, &client_index(), &[], &HashSet::new());
        assert_eq!(orphans.len(), 2);
    }
}
