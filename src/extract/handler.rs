//! Handler-route extraction from backend handler source.
//!
//! Two strategies, tried in priority order per file (a fallback chain, never
//! a merge — merging would duplicate or conflict records for one handler):
//!
//! 1. **Structured doc-block**: a `Routes:` block of `- METHOD /path` lines,
//!    in a comment or docstring. Authoritative when routing is fully dynamic
//!    (the dispatcher pattern) and static analysis of the dispatch logic
//!    cannot recover the path.
//! 2. **Static dispatch analysis**: equality comparisons against a path
//!    variable, substring membership tests resolved through an explicit
//!    substring→route table, and calls against precompiled match patterns
//!    reverse-translated into templates.
//!
//! As a last resort, a file that defines a handler function but yields no
//! routes gets a best-effort path inferred from the function name; such
//! records are flagged `inferred_path` and later enriched against the
//! gateway's declared templates.
//!
//! The extractor also captures which `pathParameters` names each handler
//! body actually reads, for the lambda extraction consistency check.

use super::client::{line_of, snippet};
use super::RouteExtractor;
use crate::normalize::{pattern_to_template, template_params};
use crate::record::{parse_method, Layer, ParamNames, RouteRecord};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Known path substrings and the full route their membership test dispatches
/// to. A bare `'/members' in path` is ambiguous without dispatcher-specific
/// context, so the mapping is explicit and extensible; unknown substrings
/// are skipped rather than guessed.
pub const SUBSTRING_ROUTES: &[(&str, &str)] = &[
    ("/members/invite", "/orgs/{orgId}/members/invite"),
    ("/members", "/orgs/{orgId}/members"),
    ("/kb", "/workspaces/{workspaceId}/kb"),
    ("/models", "/providers/{providerId}/models"),
    ("/providers", "/providers/{providerId}"),
];

static DOC_ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\s*#?\s*-\s+(?P<method>[A-Za-z]+)\s+(?P<path>/\S*)\s*$").unwrap()
});

static RE_BINDING_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"(?m)^\s*(?P<name>\w+)\s*=\s*re\.compile\(\s*r?['"](?P<pattern>[^'"]+)['"]\s*\)"#)
        .unwrap()
});

static RE_USE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?P<name>\w+)\.(?:fullmatch|match|search)\(").unwrap()
});

static PATH_EQ_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"==\s*['"](?P<path>/[^'"]*)['"]"#).unwrap()
});

static METHOD_EQ_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"(?:http_method|httpMethod|method)\b[^=<>!]*==\s*['"](?P<m>[A-Za-z]+)['"]"#)
        .unwrap()
});

static MEMBERSHIP_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"['"](?P<sub>/[^'"]+)['"]\s+in\s+(?:\w*path\w*|event)"#).unwrap()
});

static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\s*def\s+(?P<name>\w+)\s*\(").unwrap()
});

static PARAM_SUBSCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r#"pathParameters['"]\]\s*(?:\[['"](?P<sub>\w+)['"]\]|\.get\(\s*['"](?P<get>\w+)['"])"#,
    )
    .unwrap()
});

static PARAM_GETCHAIN_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"pathParameters['"]\s*(?:,\s*\{\}\s*)?\)\s*\.get\(\s*['"](?P<name>\w+)['"]"#)
        .unwrap()
});

/// Verb prefixes recognized when inferring a path from a function name.
const VERB_PREFIXES: &[(&str, Method)] = &[
    ("get_", Method::GET),
    ("list_", Method::GET),
    ("create_", Method::POST),
    ("post_", Method::POST),
    ("update_", Method::PUT),
    ("put_", Method::PUT),
    ("patch_", Method::PATCH),
    ("delete_", Method::DELETE),
    ("handle_", Method::GET),
];

/// Extracts [`RouteRecord`]s from backend handler source.
pub struct HandlerRouteExtractor;

impl RouteExtractor for HandlerRouteExtractor {
    fn layer(&self) -> Layer {
        Layer::Handler
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn extract_file(&self, file: &Path, source: &str) -> Vec<RouteRecord> {
        let mut records = doc_block_routes(file, source);
        if records.is_empty() {
            records = dispatch_routes(file, source);
        }
        if records.is_empty() {
            if let Some(record) = inferred_route(file, source) {
                records.push(record);
            }
        }
        attach_extracted_params(&mut records, source);
        records
    }
}

/// Strategy 1: parse a structured `Routes:` doc-block.
fn doc_block_routes(file: &Path, source: &str) -> Vec<RouteRecord> {
    let mut records = Vec::new();
    let mut in_block = false;
    let mut block_line = 0usize;
    for (idx, line) in source.lines().enumerate() {
        if line.contains("Routes:") {
            in_block = true;
            block_line = idx;
            continue;
        }
        if !in_block {
            continue;
        }
        if let Some(caps) = DOC_ROUTE_RE.captures(line) {
            let Some(method) = parse_method(&caps["method"]) else {
                continue;
            };
            let path = caps["path"].to_string();
            let mut record =
                RouteRecord::new(file, idx + 1, method, path.clone(), snippet(line));
            record.path_params = template_params(&path);
            record.handler_name = enclosing_def(source, block_line);
            records.push(record);
        } else if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
            in_block = false;
        }
    }
    records
}

/// Strategy 2: statically analyze conditional dispatch.
fn dispatch_routes(file: &Path, source: &str) -> Vec<RouteRecord> {
    let patterns: HashMap<String, String> = RE_BINDING_RE
        .captures_iter(source)
        .map(|c| (c["name"].to_string(), c["pattern"].to_string()))
        .collect();

    let mut records = Vec::new();
    let mut push = |file: &Path, idx: usize, line: &str, method: Method, path: String| {
        let mut record = RouteRecord::new(file, idx + 1, method, path.clone(), snippet(line));
        record.path_params = template_params(&path);
        record.handler_name = enclosing_def(source, idx);
        records.push(record);
    };

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        let method = METHOD_EQ_RE
            .captures(line)
            .and_then(|c| parse_method(&c["m"]))
            .unwrap_or(Method::GET);

        // Equality comparison against the path variable.
        if line.contains("path") {
            if let Some(caps) = PATH_EQ_RE.captures(line) {
                push(file, idx, line, method.clone(), caps["path"].to_string());
                continue;
            }
        }

        // Substring membership: ambiguous alone, resolved through the table.
        if let Some(caps) = MEMBERSHIP_RE.captures(line) {
            let sub = &caps["sub"];
            match SUBSTRING_ROUTES.iter().find(|(s, _)| *s == sub) {
                Some((_, route)) => {
                    push(file, idx, line, method.clone(), (*route).to_string());
                }
                None => {
                    debug!(
                        file = %file.display(),
                        line = idx + 1,
                        substring = sub,
                        "Membership test on unknown path substring, skipping"
                    );
                }
            }
            continue;
        }

        // Calls against precompiled match patterns.
        for caps in RE_USE_RE.captures_iter(line) {
            if let Some(pattern) = patterns.get(&caps["name"]) {
                push(
                    file,
                    idx,
                    line,
                    method.clone(),
                    pattern_to_template(pattern),
                );
            }
        }
    }
    records
}

/// Last resort: infer an implicit path from the handler function name.
///
/// Best-effort and not always correct; the record is flagged so the gateway
/// enrichment pass can replace the guess with the declared template.
fn inferred_route(file: &Path, source: &str) -> Option<RouteRecord> {
    let mut fallback_def: Option<(usize, String)> = None;
    for (idx, line) in source.lines().enumerate() {
        if let Some(caps) = DEF_RE.captures(line) {
            let name = caps["name"].to_string();
            if name == "lambda_handler" || name == "handler" || name.ends_with("_handler") {
                fallback_def = Some((idx, name));
                break;
            }
            if fallback_def.is_none() && !name.starts_with('_') {
                fallback_def = Some((idx, name));
            }
        }
    }
    let (idx, def_name) = fallback_def?;

    let mut base = def_name
        .strip_suffix("_handler")
        .unwrap_or(&def_name)
        .to_string();
    let mut method = Method::GET;
    for (prefix, verb_method) in VERB_PREFIXES {
        if let Some(rest) = base.strip_prefix(prefix) {
            base = rest.to_string();
            method = verb_method.clone();
            break;
        }
    }
    if base.is_empty() || base == "lambda" {
        base = file.file_stem()?.to_string_lossy().to_string();
    }

    let path = format!("/{}", base.replace('_', "-"));
    let mut record = RouteRecord::new(
        file,
        idx + 1,
        method,
        path,
        format!("def {}(...)", def_name),
    );
    record.inferred_path = true;
    record.handler_name = Some(def_name);
    Some(record)
}

/// Name of the function whose body contains line `idx`, scanning upward.
fn enclosing_def(source: &str, idx: usize) -> Option<String> {
    source
        .lines()
        .take(idx + 1)
        .collect::<Vec<_>>()
        .iter()
        .rev()
        .find_map(|l| DEF_RE.captures(l).map(|c| c["name"].to_string()))
}

/// Attach `pathParameters` accesses to the records of their enclosing
/// handler function. When a file yields a single route, every access in the
/// file belongs to it; with multiple routes, attribution goes through the
/// enclosing `def` and unattributable accesses are dropped rather than
/// guessed.
fn attach_extracted_params(records: &mut [RouteRecord], source: &str) {
    let mut accesses: Vec<(String, Option<String>)> = Vec::new();
    for caps in PARAM_SUBSCRIPT_RE.captures_iter(source) {
        let name = caps
            .name("sub")
            .or_else(|| caps.name("get"))
            .map(|m| m.as_str().to_string());
        if let Some(name) = name {
            let line = line_of(source, caps.get(0).map(|m| m.start()).unwrap_or(0));
            accesses.push((name, enclosing_def(source, line.saturating_sub(1))));
        }
    }
    for caps in PARAM_GETCHAIN_RE.captures_iter(source) {
        let line = line_of(source, caps.get(0).map(|m| m.start()).unwrap_or(0));
        accesses.push((
            caps["name"].to_string(),
            enclosing_def(source, line.saturating_sub(1)),
        ));
    }
    if accesses.is_empty() {
        return;
    }

    let single = records.len() == 1;
    for record in records.iter_mut() {
        let mut extracted = ParamNames::new();
        for (name, def) in &accesses {
            let belongs = single || (record.handler_name.is_some() && *def == record.handler_name);
            if belongs && !extracted.iter().any(|n| n == name) {
                extracted.push(name.clone());
            }
        }
        record.extracted_params = extracted;
    }
}
