//! Path canonicalization.
//!
//! Every layer expresses "the same route" differently: frontend source uses
//! template interpolation (`/orgs/${orgId}`), the gateway declares brace
//! templates (`/orgs/{orgId}`), and handler dispatch logic matches
//! precompiled patterns (`^/orgs/[^/]+$`). [`normalize`] folds all of them
//! into one [`CanonicalPath`] where every parameter segment is the generic
//! placeholder `{*}`, so `(method, canonical path)` is a usable identity key
//! across layers. Parameter *names* are deliberately discarded here; the
//! matcher diffs them separately.

use crate::record::ParamNames;
use once_cell::sync::Lazy;
use regex::Regex;

/// The generic placeholder every parameter segment collapses to.
pub const PARAM_PLACEHOLDER: &str = "{*}";

/// Ordered lookup from a literal path segment to the parameter name its
/// following dynamic segment conventionally carries. Used when reverse
/// translating compiled match patterns, where the original parameter name
/// is lost. Extensible by adding rows; first match wins.
pub const SEGMENT_PARAM_NAMES: &[(&str, &str)] = &[
    ("orgs", "orgId"),
    ("organizations", "orgId"),
    ("kb", "kbId"),
    ("members", "memberId"),
    ("providers", "providerId"),
    ("models", "modelId"),
    ("chats", "chatId"),
    ("projects", "projectId"),
    ("workspaces", "workspaceId"),
    ("ws", "workspaceId"),
    ("users", "userId"),
];

/// A path template with all parameter names collapsed to one placeholder.
///
/// Two `RouteRecord`s denote the same route iff their `(method,
/// CanonicalPath)` pairs are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// The canonical path string, always starting with `/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// True when a path segment denotes a parameter in any of the notations the
/// extractors produce: `:param`, `{param}`, or a `${...}` interpolation
/// anywhere in the segment (`${kind}s` is dynamic as a whole).
#[must_use]
pub fn is_param_segment(segment: &str) -> bool {
    segment.starts_with(':')
        || (segment.starts_with('{') && segment.ends_with('}'))
        || segment.contains("${")
}

/// Canonicalize any path representation.
///
/// 1. Ensures a leading separator; an empty path becomes `/`.
/// 2. Strips trailing separators (a style concern, not a route identity
///    difference).
/// 3. Rewrites every parameter segment to [`PARAM_PLACEHOLDER`].
///
/// Case is preserved. `/ws/{id}/members`, `/ws/{workspaceId}/members` and
/// `/ws/:id/members` all normalize identically.
#[must_use]
pub fn normalize(path: &str) -> CanonicalPath {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return CanonicalPath("/".to_string());
    }

    let without_query = trimmed.split('?').next().unwrap_or(trimmed);
    let stripped = without_query.trim_matches('/');
    if stripped.is_empty() {
        return CanonicalPath("/".to_string());
    }

    let mut out = String::with_capacity(stripped.len() + 1);
    for segment in stripped.split('/') {
        if segment.is_empty() {
            continue;
        }
        out.push('/');
        if is_param_segment(segment) || segment == PARAM_PLACEHOLDER {
            out.push_str(PARAM_PLACEHOLDER);
        } else {
            out.push_str(segment);
        }
    }
    CanonicalPath(out)
}

/// Ordered parameter names of a template path, as written.
///
/// Understands `{name}`, `:name`, and `${expr}` notations. For interpolated
/// expressions the trailing identifier is used (`${user.orgId}` → `orgId`).
/// Segments that are dynamic without a recoverable name contribute nothing.
#[must_use]
pub fn template_params(path: &str) -> ParamNames {
    let mut params = ParamNames::new();
    let without_query = path.split('?').next().unwrap_or(path);
    for segment in without_query.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            if !name.is_empty() {
                params.push(name.to_string());
            }
        } else if segment.starts_with('{') && segment.ends_with('}') {
            let name = &segment[1..segment.len() - 1];
            if !name.is_empty() && name != "*" {
                params.push(name.to_string());
            }
        } else if let Some(start) = segment.find("${") {
            let rest = &segment[start + 2..];
            if let Some(end) = rest.find('}') {
                let expr = &rest[..end];
                if let Some(ident) = trailing_identifier(expr) {
                    params.push(ident.to_string());
                }
            }
        }
    }
    params
}

/// Last identifier of an interpolated expression (`user.orgId` → `orgId`).
fn trailing_identifier(expr: &str) -> Option<&str> {
    let ident = expr
        .rsplit(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()?;
    if ident.is_empty() {
        None
    } else {
        Some(ident)
    }
}

/// Conventional parameter name for the dynamic segment following `literal`.
///
/// Falls back to `id` for unknown resources.
#[must_use]
pub fn param_name_for(literal: &str) -> &'static str {
    SEGMENT_PARAM_NAMES
        .iter()
        .find(|(seg, _)| *seg == literal)
        .map(|(_, name)| *name)
        .unwrap_or("id")
}

static DYNAMIC_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    // Pattern fragments handlers use for "one path segment": [^/]+ (optionally
    // grouped), \d+, [0-9]+, \w+.
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\(?(?:\[\^/\]\+|\\d\+|\[0-9\]\+|\\w\+)\)?$").unwrap()
});

/// Reverse translate a compiled match pattern into a path template.
///
/// `^/orgs/[^/]+/members$` becomes `/orgs/{orgId}/members`: each
/// one-or-more-non-separator segment turns into a parameter named via
/// [`SEGMENT_PARAM_NAMES`], keyed on the immediately preceding literal
/// segment. Inherently heuristic and lossy; anchors and escapes are removed,
/// anything unrecognized passes through as a literal.
#[must_use]
pub fn pattern_to_template(pattern: &str) -> String {
    let mut body = pattern.trim();
    body = body.strip_prefix('^').unwrap_or(body);
    body = body.strip_suffix('$').unwrap_or(body);
    let body = body.replace("\\/", "/");

    let mut template = String::with_capacity(body.len() + 1);
    let mut prev_literal: Option<String> = None;
    for segment in body.trim_matches('/').split('/') {
        if segment.is_empty() {
            continue;
        }
        template.push('/');
        if DYNAMIC_SEGMENT_RE.is_match(segment) {
            let name = prev_literal
                .as_deref()
                .map(param_name_for)
                .unwrap_or("id");
            template.push('{');
            template.push_str(name);
            template.push('}');
            prev_literal = None;
        } else {
            let literal = segment.replace("\\.", ".").replace("\\-", "-");
            template.push_str(&literal);
            prev_literal = Some(literal);
        }
    }
    if template.is_empty() {
        template.push('/');
    }
    template
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_equivalence() {
        let a = normalize("/ws/{id}/members");
        let b = normalize("/ws/{workspaceId}/members");
        let c = normalize("/ws/:id/members");
        let d = normalize("/ws/${wsId}/members");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert_eq!(a.as_str(), "/ws/{*}/members");
    }

    #[test]
    fn test_leading_and_trailing_separators() {
        assert_eq!(normalize("orgs/{id}").as_str(), "/orgs/{*}");
        assert_eq!(normalize("/orgs/{id}/").as_str(), "/orgs/{*}");
        assert_eq!(normalize("").as_str(), "/");
        assert_eq!(normalize("/").as_str(), "/");
    }

    #[test]
    fn test_case_preserved() {
        assert_eq!(normalize("/Orgs/{id}").as_str(), "/Orgs/{*}");
    }

    #[test]
    fn test_query_string_ignored() {
        assert_eq!(normalize("/orgs?limit=10").as_str(), "/orgs");
    }

    #[test]
    fn test_template_params_notations() {
        let p = template_params("/orgs/{orgId}/members/:memberId/x/${kbId}");
        assert_eq!(p.as_slice(), ["orgId", "memberId", "kbId"]);
    }

    #[test]
    fn test_template_params_skips_placeholder() {
        assert!(template_params("/orgs/{*}").is_empty());
    }

    #[test]
    fn test_pattern_to_template_known_resources() {
        assert_eq!(
            pattern_to_template(r"^/orgs/[^/]+/members$"),
            "/orgs/{orgId}/members"
        );
        assert_eq!(
            pattern_to_template(r"^/providers/([^/]+)/models/[^/]+$"),
            "/providers/{providerId}/models/{modelId}"
        );
    }

    #[test]
    fn test_pattern_to_template_default_name() {
        assert_eq!(pattern_to_template(r"^/widgets/[^/]+$"), "/widgets/{id}");
        assert_eq!(pattern_to_template(r"^\/kb\/[^/]+$"), "/kb/{kbId}");
    }

    #[test]
    fn test_pattern_template_normalizes_like_literal() {
        let tpl = pattern_to_template(r"^/orgs/[^/]+$");
        assert_eq!(normalize(&tpl), normalize("/orgs/{orgId}"));
    }
}
