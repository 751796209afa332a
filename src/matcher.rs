//! Cross-layer matching.
//!
//! Consumes the three fully built [`RouteIndex`]es and reasons about set
//! differences between them. The passes are independent and
//! order-insensitive; the output ordering is fixed (pass order, then file
//! and line within a pass) so matching the same three indexes twice yields
//! an identical mismatch list.
//!
//! The presence/absence check operates per distinct `(method, canonical
//! path)` key, but every individual record that fails still produces its own
//! mismatch with its own file and line: three call sites hitting one broken
//! route yield three separate findings.

use crate::index::RouteIndex;
use crate::normalize::CanonicalPath;
use crate::record::RouteRecord;
use crate::report::{Mismatch, MismatchKind, Severity};
use http::Method;
use std::collections::BTreeSet;
use tracing::debug;

/// Compare the three layers and emit every drift finding.
#[must_use]
pub fn cross_validate(
    client: &RouteIndex,
    gateway: &RouteIndex,
    handler: &RouteIndex,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    client_to_gateway(client, gateway, &mut mismatches);
    gateway_to_handler(gateway, handler, &mut mismatches);
    parameter_consistency(client, handler, &mut mismatches);
    path_parameter_naming(gateway, handler, &mut mismatches);
    lambda_extraction_consistency(handler, gateway, &mut mismatches);
    debug!(mismatches = mismatches.len(), "Cross-layer matching complete");
    mismatches
}

/// Pass 1: every client call must hit a declared gateway route.
fn client_to_gateway(client: &RouteIndex, gateway: &RouteIndex, out: &mut Vec<Mismatch>) {
    for ((method, path), records) in client.iter_sorted() {
        if gateway.contains(method, path) {
            continue;
        }
        // Re-search by path only: a hit means the path exists under other
        // methods, which is a different, more actionable finding.
        let supported = gateway.methods_for_path(path);
        for record in records {
            if supported.is_empty() {
                out.push(
                    Mismatch::new(
                        MismatchKind::RouteNotFound,
                        Severity::Error,
                        format!(
                            "client calls {} {} but the gateway declares no such route",
                            method, path
                        ),
                    )
                    .with_location(&record.source_file, record.source_line)
                    .with_suggestion(format!(
                        "declare {} {} in the gateway route table or fix the call",
                        method, path
                    )),
                );
            } else {
                let methods = method_list(&supported);
                let mut m = Mismatch::new(
                    MismatchKind::MethodMismatch,
                    Severity::Error,
                    format!(
                        "client calls {} {} but the gateway only accepts {}",
                        method, path, methods
                    ),
                )
                .with_location(&record.source_file, record.source_line)
                .with_suggestion(format!("use {} or declare {} for this route", methods, method));
                if let Some(gw) = first_record(gateway, &supported[0], path) {
                    m = m.with_location(&gw.source_file, gw.source_line);
                }
                out.push(m);
            }
        }
    }
}

/// Pass 2: every declared gateway route must have a handler.
///
/// Always error severity: an undeclared-but-implemented route may be
/// intentional; a declared-but-unimplemented one never is.
fn gateway_to_handler(gateway: &RouteIndex, handler: &RouteIndex, out: &mut Vec<Mismatch>) {
    for ((method, path), records) in gateway.iter_sorted() {
        if handler.contains(method, path) {
            continue;
        }
        let supported = handler.methods_for_path(path);
        for record in records {
            if supported.is_empty() {
                out.push(
                    Mismatch::new(
                        MismatchKind::MissingHandler,
                        Severity::Error,
                        format!(
                            "gateway declares {} {} but no handler implements it",
                            method, path
                        ),
                    )
                    .with_location(&record.source_file, record.source_line)
                    .with_suggestion(format!(
                        "implement a handler for {} {} or remove the declaration",
                        method, path
                    )),
                );
            } else {
                let methods = method_list(&supported);
                let mut m = Mismatch::new(
                    MismatchKind::MethodMismatch,
                    Severity::Error,
                    format!(
                        "gateway declares {} {} but handlers only implement {}",
                        method, path, methods
                    ),
                )
                .with_location(&record.source_file, record.source_line);
                if let Some(h) = first_record(handler, &supported[0], path) {
                    m = m.with_location(&h.source_file, h.source_line);
                }
                out.push(m);
            }
        }
    }
}

/// Pass 3: client and handler must agree on parameter names per route.
///
/// Name sets are diffed, not just counts. Warning severity: a one-sided
/// name is benign when a capture is simply unused.
fn parameter_consistency(client: &RouteIndex, handler: &RouteIndex, out: &mut Vec<Mismatch>) {
    for ((method, path), client_records) in client.iter_sorted() {
        let Some(handler_records) = handler.get(method, path) else {
            continue;
        };
        let handler_names = declared_names(handler_records);
        if handler_names.is_empty() {
            continue;
        }
        for record in client_records {
            if record.path_params.is_empty() {
                continue;
            }
            let client_names: BTreeSet<&str> =
                record.path_params.iter().map(String::as_str).collect();
            let only_client: Vec<&str> =
                client_names.difference(&handler_names).copied().collect();
            let only_handler: Vec<&str> =
                handler_names.difference(&client_names).copied().collect();
            if only_client.is_empty() && only_handler.is_empty() {
                continue;
            }
            let mut m = Mismatch::new(
                MismatchKind::ParameterMismatch,
                Severity::Warning,
                format!(
                    "parameter names for {} {} disagree: client has [{}], handler has [{}]",
                    method,
                    path,
                    record.path_params.join(", "),
                    handler_names.iter().copied().collect::<Vec<_>>().join(", ")
                ),
            )
            .with_location(&record.source_file, record.source_line)
            .with_suggestion("align the parameter names across layers");
            if let Some(h) = handler_records.first() {
                m = m.with_location(&h.source_file, h.source_line);
            }
            out.push(m);
        }
    }
}

/// Pass 4: gateway and handler templates for one route should name their
/// parameters identically.
fn path_parameter_naming(gateway: &RouteIndex, handler: &RouteIndex, out: &mut Vec<Mismatch>) {
    for ((method, path), gateway_records) in gateway.iter_sorted() {
        let Some(handler_records) = handler.get(method, path) else {
            continue;
        };
        let gateway_names = declared_names(gateway_records);
        let handler_names = declared_names(handler_records);
        if gateway_names.is_empty() || handler_names.is_empty() || gateway_names == handler_names {
            continue;
        }
        let mut m = Mismatch::new(
            MismatchKind::PathParameterNaming,
            Severity::Warning,
            format!(
                "gateway names parameters of {} {} [{}] but handler names them [{}]",
                method,
                path,
                gateway_names.iter().copied().collect::<Vec<_>>().join(", "),
                handler_names.iter().copied().collect::<Vec<_>>().join(", ")
            ),
        )
        .with_suggestion("rename the parameters so both declarations match");
        if let Some(g) = gateway_records.first() {
            m = m.with_location(&g.source_file, g.source_line);
        }
        if let Some(h) = handler_records.first() {
            m = m.with_location(&h.source_file, h.source_line);
        }
        out.push(m);
    }
}

/// Pass 5: a handler body must only extract path parameters the gateway
/// template for that route declares.
fn lambda_extraction_consistency(
    handler: &RouteIndex,
    gateway: &RouteIndex,
    out: &mut Vec<Mismatch>,
) {
    for ((method, path), handler_records) in handler.iter_sorted() {
        let Some(gateway_records) = gateway.get(method, path) else {
            continue;
        };
        let gateway_names = declared_names(gateway_records);
        if gateway_names.is_empty() {
            continue;
        }
        for record in handler_records {
            for extracted in &record.extracted_params {
                if gateway_names.contains(extracted.as_str()) {
                    continue;
                }
                let mut m = Mismatch::new(
                    MismatchKind::LambdaParamExtractionMismatch,
                    Severity::Warning,
                    format!(
                        "handler extracts path parameter '{}' for {} {} but the gateway template declares [{}]",
                        extracted,
                        method,
                        path,
                        gateway_names.iter().copied().collect::<Vec<_>>().join(", ")
                    ),
                )
                .with_location(&record.source_file, record.source_line)
                .with_suggestion(format!(
                    "extract one of the declared names or rename the template parameter to '{}'",
                    extracted
                ));
                if let Some(g) = gateway_records.first() {
                    m = m.with_location(&g.source_file, g.source_line);
                }
                out.push(m);
            }
        }
    }
}

/// Union of declared (template) parameter names over records for one key,
/// skipping inferred paths, which never carry trustworthy names.
fn declared_names(records: &[RouteRecord]) -> BTreeSet<&str> {
    records
        .iter()
        .filter(|r| !r.inferred_path)
        .flat_map(|r| r.path_params.iter().map(String::as_str))
        .collect()
}

fn first_record<'a>(
    index: &'a RouteIndex,
    method: &Method,
    path: &CanonicalPath,
) -> Option<&'a RouteRecord> {
    index.get(method, path).and_then(<[RouteRecord]>::first)
}

fn method_list(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Layer;

    fn rec(file: &str, line: usize, method: Method, path: &str) -> RouteRecord {
        let mut r = RouteRecord::new(file, line, method, path, "");
        r.path_params = crate::normalize::template_params(path);
        r
    }

    fn index(layer: Layer, records: Vec<RouteRecord>) -> RouteIndex {
        RouteIndex::build(layer, records)
    }

    #[test]
    fn test_method_mismatch_tie_break() {
        let client = index(
            Layer::Client,
            vec![rec("a.ts", 1, Method::GET, "/orgs/${orgId}")],
        );
        let gateway = index(
            Layer::Gateway,
            vec![rec("gw.yaml", 3, Method::POST, "/orgs/{orgId}")],
        );
        let handler = index(
            Layer::Handler,
            vec![rec("h.py", 5, Method::POST, "/orgs/{orgId}")],
        );

        let mismatches = cross_validate(&client, &gateway, &handler);
        let kinds: Vec<_> = mismatches.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MismatchKind::MethodMismatch],
            "exactly one method_mismatch, never route_not_found: {:?}",
            mismatches
        );
        assert!(mismatches[0].message.contains("POST"));
    }

    #[test]
    fn test_per_record_attribution() {
        let client = index(
            Layer::Client,
            vec![
                rec("a.ts", 1, Method::GET, "/nowhere"),
                rec("b.ts", 7, Method::GET, "/nowhere"),
                rec("c.ts", 9, Method::GET, "/nowhere"),
            ],
        );
        let gateway = index(Layer::Gateway, vec![rec("gw.yaml", 1, Method::GET, "/x")]);
        let handler = index(Layer::Handler, vec![rec("h.py", 1, Method::GET, "/x")]);

        let mismatches = cross_validate(&client, &gateway, &handler);
        let not_found: Vec<_> = mismatches
            .iter()
            .filter(|m| m.kind == MismatchKind::RouteNotFound)
            .collect();
        assert_eq!(not_found.len(), 3);
        let mut lines: Vec<_> = not_found
            .iter()
            .filter_map(|m| m.primary_location().map(|l| l.line))
            .collect();
        lines.sort_unstable();
        assert_eq!(lines, vec![1, 7, 9], "each call site keeps its own file/line");
    }

    #[test]
    fn test_missing_handler_is_error() {
        let client = index(Layer::Client, vec![rec("a.ts", 1, Method::GET, "/orgs")]);
        let gateway = index(
            Layer::Gateway,
            vec![
                rec("gw.yaml", 1, Method::GET, "/orgs"),
                rec("gw.yaml", 2, Method::DELETE, "/legacy"),
            ],
        );
        let handler = index(Layer::Handler, vec![rec("h.py", 1, Method::GET, "/orgs")]);

        let mismatches = cross_validate(&client, &gateway, &handler);
        let missing: Vec<_> = mismatches
            .iter()
            .filter(|m| m.kind == MismatchKind::MissingHandler)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].severity, Severity::Error);
    }

    #[test]
    fn test_parameter_name_diff_is_warning() {
        let client = index(
            Layer::Client,
            vec![rec("a.ts", 4, Method::GET, "/ws/${id}/members")],
        );
        let gateway = index(
            Layer::Gateway,
            vec![rec("gw.yaml", 1, Method::GET, "/ws/{workspaceId}/members")],
        );
        let handler = index(
            Layer::Handler,
            vec![rec("h.py", 2, Method::GET, "/ws/{workspaceId}/members")],
        );

        let mismatches = cross_validate(&client, &gateway, &handler);
        let params: Vec<_> = mismatches
            .iter()
            .filter(|m| m.kind == MismatchKind::ParameterMismatch)
            .collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].severity, Severity::Warning);
        assert!(params[0].message.contains("workspaceId"));
    }

    #[test]
    fn test_gateway_handler_naming_diff() {
        let client = index(
            Layer::Client,
            vec![rec("a.ts", 1, Method::GET, "/orgs/${orgId}")],
        );
        let gateway = index(
            Layer::Gateway,
            vec![rec("gw.yaml", 1, Method::GET, "/orgs/{orgId}")],
        );
        let handler = index(
            Layer::Handler,
            vec![rec("h.py", 1, Method::GET, "/orgs/{organizationId}")],
        );

        let mismatches = cross_validate(&client, &gateway, &handler);
        assert!(mismatches
            .iter()
            .any(|m| m.kind == MismatchKind::PathParameterNaming));
    }

    #[test]
    fn test_lambda_extraction_mismatch() {
        let client = index(
            Layer::Client,
            vec![rec("a.ts", 1, Method::GET, "/orgs/${orgId}")],
        );
        let gateway = index(
            Layer::Gateway,
            vec![rec("gw.yaml", 1, Method::GET, "/orgs/{orgId}")],
        );
        let mut handler_rec = rec("h.py", 3, Method::GET, "/orgs/{orgId}");
        handler_rec.extracted_params.push("org_id".to_string());
        let handler = index(Layer::Handler, vec![handler_rec]);

        let mismatches = cross_validate(&client, &gateway, &handler);
        let lambda: Vec<_> = mismatches
            .iter()
            .filter(|m| m.kind == MismatchKind::LambdaParamExtractionMismatch)
            .collect();
        assert_eq!(lambda.len(), 1);
        assert!(lambda[0].message.contains("org_id"));
        assert_eq!(lambda[0].locations.len(), 2);
    }

    #[test]
    fn test_idempotence() {
        let client = index(
            Layer::Client,
            vec![
                rec("a.ts", 1, Method::GET, "/nowhere"),
                rec("a.ts", 2, Method::POST, "/orgs/${orgId}"),
            ],
        );
        let gateway = index(
            Layer::Gateway,
            vec![rec("gw.yaml", 1, Method::GET, "/orgs/{orgId}")],
        );
        let handler = index(Layer::Handler, vec![rec("h.py", 1, Method::GET, "/orgs/{orgId}")]);

        let a = cross_validate(&client, &gateway, &handler);
        let b = cross_validate(&client, &gateway, &handler);
        let fingerprint = |ms: &[Mismatch]| {
            ms.iter()
                .map(|m| format!("{}|{}|{:?}", m.kind, m.message, m.locations))
                .collect::<Vec<_>>()
        };
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_agreeing_layers_produce_nothing() {
        let client = index(
            Layer::Client,
            vec![rec("a.ts", 1, Method::GET, "/orgs/${orgId}")],
        );
        let gateway = index(
            Layer::Gateway,
            vec![rec("gw.yaml", 1, Method::GET, "/orgs/{orgId}")],
        );
        let handler = index(Layer::Handler, vec![rec("h.py", 1, Method::GET, "/orgs/{orgId}")]);
        assert!(cross_validate(&client, &gateway, &handler).is_empty());
    }
}
