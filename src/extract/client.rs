//! Client-call extraction from frontend source.
//!
//! Scans TypeScript/JavaScript for call expressions against HTTP client
//! objects (`api.get(...)`, `axios.post(...)`, `fetch(...)`) and data-fetch
//! hooks (`useSWR`, `useQuery`) whose first argument is a path expression,
//! possibly guarded by a ternary (both arms are extracted). This is heuristic
//! line-level parsing over full source files, not a JS grammar: fragments
//! that do not parse are skipped, never fatal.

use super::RouteExtractor;
use crate::normalize::template_params;
use crate::record::{parse_method, Layer, ParamNames, RouteRecord};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r"(?x)
        \b(?:
            (?:api|apiClient|axios|http|client)\.(?P<verb>get|post|put|delete|patch|head|options)
          | (?P<fetch>fetch)
          | (?P<hook>useSWR|useQuery)
        )\s*\(",
    )
    .unwrap()
});

static METHOD_OPTION_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"method\s*:\s*['"](?P<m>[A-Za-z]+)['"]"#).unwrap()
});

/// Base-URL interpolation variables stripped off the front of a path literal.
const BASE_URL_VARS: &[&str] = &[
    "API_BASE_URL",
    "API_BASE",
    "BASE_URL",
    "baseUrl",
    "apiBase",
    "apiUrl",
];

/// Extracts [`RouteRecord`]s from frontend call sites.
pub struct ClientCallExtractor;

impl RouteExtractor for ClientCallExtractor {
    fn layer(&self) -> Layer {
        Layer::Client
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx"]
    }

    fn extract_file(&self, file: &Path, source: &str) -> Vec<RouteRecord> {
        let mut records = Vec::new();
        let mut seen: Vec<(usize, Method, String)> = Vec::new();

        for m in CALL_RE.find_iter(source) {
            let line = line_of(source, m.start());
            let line_text = source.lines().nth(line - 1).unwrap_or("");
            let trimmed = line_text.trim_start();
            if trimmed.starts_with("//") || trimmed.starts_with('*') {
                continue;
            }

            let caps = match CALL_RE.captures(&source[m.start()..m.end()]) {
                Some(c) => c,
                None => continue,
            };
            let open = m.end() - 1;
            let args = match call_args(source, open) {
                Some(a) => a,
                None => continue, // unbalanced fragment, skip
            };
            let first = first_argument(args);

            let method = if let Some(verb) = caps.name("verb") {
                match parse_method(verb.as_str()) {
                    Some(m) => m,
                    None => continue,
                }
            } else if caps.name("hook").is_some() {
                Method::GET
            } else {
                // fetch: method comes from the options object when present
                METHOD_OPTION_RE
                    .captures(&args[first.len()..])
                    .and_then(|c| parse_method(&c["m"]))
                    .unwrap_or(Method::GET)
            };

            for literal in string_literals(first) {
                let Some(path) = path_candidate(&literal) else {
                    continue;
                };
                let (path_part, query_params) = split_query(&path);
                let key = (line, method.clone(), path_part.clone());
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);

                let mut record = RouteRecord::new(
                    file,
                    line,
                    method.clone(),
                    path_part,
                    snippet(line_text),
                );
                record.path_params = template_params(&record.raw_path);
                record.query_params = query_params;
                records.push(record);
            }
        }
        records
    }
}

/// Turn one extracted string literal into a path, or reject it.
///
/// Strips known base-URL interpolation prefixes and absolute URL origins.
/// Rejects overly generic single-variable paths (the entire path held in one
/// interpolated variable, e.g. `${url}`): those originate one level removed
/// through a wrapper and would otherwise look like phantom routes.
fn path_candidate(literal: &str) -> Option<String> {
    let mut had_base = false;
    let mut rest = literal;

    for var in BASE_URL_VARS {
        let prefix = format!("${{{}}}", var);
        if let Some(stripped) = rest.strip_prefix(&prefix) {
            rest = stripped;
            had_base = true;
            break;
        }
    }
    if !had_base {
        if let Some(scheme_end) = rest.find("://") {
            if rest[..scheme_end].chars().all(|c| c.is_ascii_alphabetic()) {
                let after = &rest[scheme_end + 3..];
                match after.find('/') {
                    Some(slash) => {
                        rest = &after[slash..];
                        had_base = true;
                    }
                    None => return None,
                }
            }
        }
    }

    let path = if rest.starts_with('/') {
        rest.to_string()
    } else if had_base && !rest.is_empty() {
        format!("/{}", rest)
    } else {
        return None; // not a path literal (e.g. a cache key)
    };

    // Generic-path rejection: no literal segment at all.
    let body = path.trim_matches('/');
    if body.is_empty() {
        return None;
    }
    let all_dynamic = body.split('/').all(|seg| {
        let seg = seg.trim();
        seg.starts_with("${") && seg.ends_with('}') && seg.matches("${").count() == 1
    });
    if all_dynamic {
        return None;
    }
    Some(path)
}

/// Split a trailing query string into its parameter names.
fn split_query(path: &str) -> (String, ParamNames) {
    let mut names = ParamNames::new();
    match path.split_once('?') {
        Some((before, query)) => {
            for pair in query.split('&') {
                let name = pair.split('=').next().unwrap_or("").trim();
                if !name.is_empty() && !name.contains("${") {
                    names.push(name.to_string());
                }
            }
            (before.to_string(), names)
        }
        None => (path.to_string(), names),
    }
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

/// The argument text of a call, given the offset of its opening paren.
///
/// Balances parens while tracking quote state so parens inside string and
/// template literals do not confuse the scan. Returns `None` for fragments
/// that never close (truncated or unparseable source).
pub(crate) fn call_args(source: &str, open: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The first top-level argument of an argument list.
pub(crate) fn first_argument(args: &str) -> &str {
    let bytes = args.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => return &args[..i],
            _ => {}
        }
    }
    args
}

/// Every string/template literal in an expression, in order.
pub(crate) fn string_literals(expr: &str) -> Vec<String> {
    let bytes = expr.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' || b == b'"' || b == b'`' {
            let mut j = i + 1;
            let mut escaped = false;
            while j < bytes.len() {
                if escaped {
                    escaped = false;
                } else if bytes[j] == b'\\' {
                    escaped = true;
                } else if bytes[j] == b {
                    break;
                }
                j += 1;
            }
            if j < bytes.len() {
                out.push(expr[i + 1..j].to_string());
                i = j + 1;
                continue;
            }
            break; // unterminated literal, give up on the rest
        }
        i += 1;
    }
    out
}

/// Origin snippet for diagnostics, capped to one trimmed line.
pub(crate) fn snippet(line_text: &str) -> String {
    let t = line_text.trim();
    if t.len() > 120 {
        format!("{}…", &t[..t.char_indices().take(119).last().map(|(i, c)| i + c.len_utf8()).unwrap_or(119)])
    } else {
        t.to_string()
    }
}
