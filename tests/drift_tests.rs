//! End-to-end drift checks over checked-in fixture trees.
//!
//! The `clean` fixture is three layers that fully agree; the `drift` fixture
//! is engineered so every mismatch kind fires exactly once.

use apidrift::config::ValidationConfig;
use apidrift::extract::{
    enrich_handler_routes, extract_gateway_routes, extract_handler_routes, GatewayRoutes,
};
use apidrift::matcher::cross_validate;
use apidrift::normalize::normalize;
use apidrift::orphan::{compile_exclusions, detect_orphans};
use apidrift::record::Layer;
use apidrift::report::{exit_code, has_errors, Mismatch, MismatchKind, Severity};
use apidrift::runtime_config::RuntimeConfig;
use apidrift::RouteIndex;
use http::Method;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Run the full pipeline over one fixture tree, the way the `check` command
/// wires it together.
fn check(dir: &Path, config_file: Option<&str>) -> Vec<Mismatch> {
    let config = match config_file {
        Some(name) => ValidationConfig::load(&dir.join(name)).unwrap(),
        None => ValidationConfig::default(),
    };
    let runtime = RuntimeConfig::default();

    let client_records = apidrift::extract::extract_client_routes(
        &dir.join("frontend"),
        config.scope.as_deref(),
        runtime,
    )
    .unwrap();
    let GatewayRoutes {
        records: gateway_records,
        mut documented,
    } = extract_gateway_routes(&dir.join("gateway.yaml")).unwrap();
    let handler_records =
        extract_handler_routes(&dir.join("handlers"), config.scope.as_deref(), runtime).unwrap();
    let handler_records = enrich_handler_routes(handler_records, &gateway_records);

    let client = RouteIndex::build(Layer::Client, client_records);
    let gateway = RouteIndex::build(Layer::Gateway, gateway_records);
    let handler = RouteIndex::build(Layer::Handler, handler_records);

    documented.extend(config.documented_keys());
    let exclusions = compile_exclusions(&config.exclusions).unwrap();

    let mut mismatches = cross_validate(&client, &gateway, &handler);
    mismatches.extend(detect_orphans(&handler, &client, &exclusions, &documented));
    mismatches
}

fn count(mismatches: &[Mismatch], kind: MismatchKind) -> usize {
    mismatches.iter().filter(|m| m.kind == kind).count()
}

#[test]
fn test_clean_tree_has_no_findings() {
    let mismatches = check(&fixture("clean"), None);
    assert!(
        mismatches.is_empty(),
        "agreeing layers must produce no findings: {:?}",
        mismatches
    );
}

#[test]
fn test_drifted_tree_reports_each_kind_once() {
    let mismatches = check(&fixture("drift"), Some("apidrift.yaml"));

    for kind in [
        MismatchKind::RouteNotFound,
        MismatchKind::MethodMismatch,
        MismatchKind::MissingHandler,
        MismatchKind::ParameterMismatch,
        MismatchKind::PathParameterNaming,
        MismatchKind::LambdaParamExtractionMismatch,
        MismatchKind::OrphanedRoute,
    ] {
        assert_eq!(
            count(&mismatches, kind),
            1,
            "expected exactly one {} finding: {:?}",
            kind,
            mismatches
        );
    }
    assert_eq!(mismatches.len(), 7);

    let errors = mismatches
        .iter()
        .filter(|m| m.severity == Severity::Error)
        .count();
    assert_eq!(errors, 3, "presence/method findings are errors: {:?}", mismatches);
}

#[test]
fn test_findings_point_at_the_offending_call_site() {
    let mismatches = check(&fixture("drift"), Some("apidrift.yaml"));

    let not_found = mismatches
        .iter()
        .find(|m| m.kind == MismatchKind::RouteNotFound)
        .unwrap();
    assert!(not_found.message.contains("/orgs/{*}/billing"));
    let loc = not_found.primary_location().unwrap();
    assert!(loc.file.ends_with("api.ts"), "got {:?}", loc);
    assert_eq!(loc.line, 5);

    // Method mismatch names the verbs the gateway does accept and points at
    // both the call site and the declaration.
    let method = mismatches
        .iter()
        .find(|m| m.kind == MismatchKind::MethodMismatch)
        .unwrap();
    assert!(method.message.contains("DELETE"));
    assert!(method.message.contains("GET"));
    assert_eq!(method.locations.len(), 2);
}

#[test]
fn test_exit_codes() {
    let clean = check(&fixture("clean"), None);
    assert_eq!(exit_code(&clean, false), 0);
    assert_eq!(exit_code(&clean, true), 0);

    let drift = check(&fixture("drift"), Some("apidrift.yaml"));
    assert!(has_errors(&drift));
    assert_eq!(exit_code(&drift, false), 1);

    let warnings_only: Vec<Mismatch> = drift
        .iter()
        .filter(|m| m.severity == Severity::Warning)
        .cloned()
        .collect();
    assert_eq!(exit_code(&warnings_only, false), 0);
    assert_eq!(exit_code(&warnings_only, true), 1);
}

#[test]
fn test_union_discriminator_expands_into_concrete_routes() {
    let runtime = RuntimeConfig::default();
    let records = apidrift::extract::extract_client_routes(
        &fixture("clean").join("frontend"),
        None,
        runtime,
    )
    .unwrap();
    let client = RouteIndex::build(Layer::Client, records);

    assert!(client.contains(&Method::GET, &normalize("/chats/{chatId}/kb")));
    assert!(client.contains(&Method::GET, &normalize("/projects/{projectId}/kb")));
    // The unexpanded template must not leak through as a route of its own.
    assert!(!client
        .keys_sorted()
        .iter()
        .any(|(_, p)| p.as_str().contains("kind")));
}

#[test]
fn test_inferred_handler_path_enriched_from_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("frontend")).unwrap();
    std::fs::create_dir_all(root.join("handlers")).unwrap();
    std::fs::write(
        root.join("frontend/billing.ts"),
        "export const getInvoice = (invoiceId: string) => api.get(`/billing/${invoiceId}`);\n",
    )
    .unwrap();
    std::fs::write(
        root.join("gateway.yaml"),
        "routes:\n  - method: GET\n    path: /billing/{invoiceId}\n    handler: get_invoice_handler\n",
    )
    .unwrap();
    // No recoverable route in the body: the path must come from the name, then
    // be replaced by the gateway's declared template.
    std::fs::write(
        root.join("handlers/billing.py"),
        "def get_invoice_handler(event, context):\n    return billing.load(event)\n",
    )
    .unwrap();

    let mismatches = check(root, None);
    assert!(
        mismatches.is_empty(),
        "enrichment must reconcile the inferred path: {:?}",
        mismatches
    );
}
