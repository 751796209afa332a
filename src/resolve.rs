//! Dynamic route resolution for union-typed discriminators.
//!
//! Some client calls build a path segment from a variable whose declared
//! type is a finite union of string literals (an entity-kind discriminator)
//! rather than a genuine path parameter:
//!
//! ```ts
//! function loadKb(kind: "chat" | "project", entityId: string) {
//!   return fetch(`/${kind}s/${entityId}/kb`);
//! }
//! ```
//!
//! One such call denotes two concrete routes. [`resolve`] finds the union in
//! the surrounding file (a parameter annotation or a type alias matching the
//! variable's name) and emits one concrete record per member, propagating
//! the sibling-naming convention: a generic `entityId` placeholder becomes
//! `{chatId}` when the discriminator resolves to `"chat"`. If no finite
//! union is found the record is returned unchanged — under-resolution is the
//! safe default; over-resolution would fabricate routes that don't exist.

use crate::normalize::template_params;
use crate::record::RouteRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Parameter names treated as generic entity placeholders, eligible for
/// renaming when a sibling discriminator resolves.
const GENERIC_ENTITY_PARAMS: &[&str] = &["entityId", "id", "itemId"];

static INTERP_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

static TYPE_ALIAS_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r#"(?m)\btype\s+(?P<alias>\w+)\s*=\s*(?P<union>(?:"[^"]+"|'[^']+')(?:\s*\|\s*(?:"[^"]+"|'[^']+'))+)"#,
    )
    .unwrap()
});

/// Expand a record whose path interpolates a union-typed discriminator.
///
/// Applies recursively so a path with two discriminators expands into the
/// full product, with a small depth cap since real paths never nest deeply.
#[must_use]
pub fn resolve(record: &RouteRecord, source: &str) -> Vec<RouteRecord> {
    resolve_depth(record, source, 0)
}

fn resolve_depth(record: &RouteRecord, source: &str, depth: usize) -> Vec<RouteRecord> {
    if depth >= 3 {
        return vec![record.clone()];
    }
    for caps in INTERP_RE.captures_iter(&record.raw_path) {
        let var = &caps["name"];
        if let Some(members) = union_members(source, var) {
            debug!(
                variable = var,
                members = ?members,
                path = %record.raw_path,
                "Expanding union-typed path discriminator"
            );
            let mut out = Vec::with_capacity(members.len());
            for member in &members {
                let expanded = substitute(record, var, member);
                out.extend(resolve_depth(&expanded, source, depth + 1));
            }
            return out;
        }
    }
    vec![record.clone()]
}

/// Union literal members for a variable, or `None` when the variable is not
/// statically constrained to a finite set.
///
/// Looks for a parameter type annotation (`kind: "chat" | "project"`) and,
/// failing that, a type alias whose name matches the variable
/// case-insensitively (`type Kind = "chat" | "project"` for `kind`).
fn union_members(source: &str, var: &str) -> Option<Vec<String>> {
    let annotation = Regex::new(&format!(
        r#"\b{}\s*:\s*((?:"[^"]+"|'[^']+')(?:\s*\|\s*(?:"[^"]+"|'[^']+'))+)"#,
        regex::escape(var)
    ))
    .ok()?;
    if let Some(caps) = annotation.captures(source) {
        return Some(literals_of(&caps[1]));
    }
    for caps in TYPE_ALIAS_RE.captures_iter(source) {
        if caps["alias"].eq_ignore_ascii_case(var) {
            return Some(literals_of(&caps["union"]));
        }
    }
    None
}

fn literals_of(union: &str) -> Vec<String> {
    union
        .split('|')
        .filter_map(|part| {
            let part = part.trim();
            part.strip_prefix('"')
                .and_then(|p| p.strip_suffix('"'))
                .or_else(|| part.strip_prefix('\'').and_then(|p| p.strip_suffix('\'')))
                .map(str::to_string)
        })
        .collect()
}

/// Substitute one union member for the discriminator and rename sibling
/// generic entity parameters to the discriminated form.
fn substitute(record: &RouteRecord, var: &str, member: &str) -> RouteRecord {
    let mut raw_path = record
        .raw_path
        .replace(&format!("${{{}}}", var), member);

    for generic in GENERIC_ENTITY_PARAMS {
        let needle = format!("${{{}}}", generic);
        if raw_path.contains(&needle) {
            raw_path = raw_path.replace(&needle, &format!("{{{}Id}}", member));
            break;
        }
    }

    let mut out = record.clone();
    out.raw_path = raw_path;
    out.path_params = template_params(&out.raw_path);
    out
}
