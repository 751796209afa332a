//! Gateway-backed enrichment of handler routes.
//!
//! Name-inferred handler paths are guesses. When the gateway table maps the
//! same handler name, the declared template is authoritative and replaces
//! the guess. Pure function over its inputs so the pass is independently
//! testable; nothing is mutated in place.

use crate::record::RouteRecord;
use tracing::debug;

/// Substitute gateway-declared templates for name-inferred handler paths.
///
/// Records that were not inferred, or whose handler name the gateway does
/// not know, pass through unchanged — under-enrichment is the safe default.
#[must_use]
pub fn enrich_handler_routes(
    handler_routes: Vec<RouteRecord>,
    gateway_routes: &[RouteRecord],
) -> Vec<RouteRecord> {
    handler_routes
        .into_iter()
        .map(|record| enrich_one(record, gateway_routes))
        .collect()
}

fn enrich_one(record: RouteRecord, gateway_routes: &[RouteRecord]) -> RouteRecord {
    if !record.inferred_path {
        return record;
    }
    let Some(handler_name) = record.handler_name.as_deref() else {
        return record;
    };
    let declared = gateway_routes.iter().find(|g| {
        g.handler_name
            .as_deref()
            .map(|n| n.eq_ignore_ascii_case(handler_name))
            .unwrap_or(false)
    });
    match declared {
        Some(gateway) => {
            debug!(
                handler = handler_name,
                inferred = %record.raw_path,
                declared = %gateway.raw_path,
                "Replacing inferred handler path with gateway template"
            );
            let mut enriched = record;
            enriched.raw_path = gateway.raw_path.clone();
            enriched.path_params = gateway.path_params.clone();
            enriched.method = gateway.method.clone();
            enriched.inferred_path = false;
            enriched
        }
        None => record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn inferred(name: &str, path: &str) -> RouteRecord {
        let mut r = RouteRecord::new("handlers/h.py", 1, Method::GET, path, "");
        r.inferred_path = true;
        r.handler_name = Some(name.to_string());
        r
    }

    fn gateway(name: &str, method: Method, path: &str) -> RouteRecord {
        let mut r = RouteRecord::new("gateway.yaml", 1, method, path, "");
        r.handler_name = Some(name.to_string());
        r.path_params = crate::normalize::template_params(path);
        r
    }

    #[test]
    fn test_inferred_path_replaced_by_declared_template() {
        let out = enrich_handler_routes(
            vec![inferred("get_org", "/org")],
            &[gateway("get_org", Method::GET, "/orgs/{orgId}")],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].raw_path, "/orgs/{orgId}");
        assert_eq!(out[0].path_params.as_slice(), ["orgId"]);
        assert!(!out[0].inferred_path);
        // Source attribution stays with the handler file.
        assert_eq!(out[0].source_file.to_string_lossy(), "handlers/h.py");
    }

    #[test]
    fn test_unknown_handler_passes_through() {
        let out = enrich_handler_routes(
            vec![inferred("mystery", "/mystery")],
            &[gateway("get_org", Method::GET, "/orgs/{orgId}")],
        );
        assert_eq!(out[0].raw_path, "/mystery");
        assert!(out[0].inferred_path);
    }

    #[test]
    fn test_observed_routes_never_touched() {
        let observed = RouteRecord::new("handlers/h.py", 3, Method::GET, "/orgs", "");
        let out = enrich_handler_routes(
            vec![observed],
            &[gateway("get_org", Method::GET, "/orgs/{orgId}")],
        );
        assert_eq!(out[0].raw_path, "/orgs");
    }
}
