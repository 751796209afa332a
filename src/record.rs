//! Core data model shared by every extractor and the matching engine.
//!
//! A [`RouteRecord`] is one observed occurrence of a route at a specific
//! source location. Records are immutable once produced by an extractor;
//! everything downstream (resolution, indexing, matching) either reads them
//! or builds new records from them.

use http::Method;
use smallvec::SmallVec;
use std::path::{Path, PathBuf};

/// Maximum number of path/query parameters before heap allocation.
/// Most REST routes have ≤4 path params (e.g., /orgs/{orgId}/members/{memberId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter name storage.
///
/// Uses `SmallVec` so records for typical routes carry their parameter
/// names without touching the heap.
pub type ParamNames = SmallVec<[String; MAX_INLINE_PARAMS]>;

/// Which of the three API-surface descriptions a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Frontend call sites (fetch/axios/hook invocations)
    Client,
    /// The declared gateway route table
    Gateway,
    /// Backend handler route definitions
    Handler,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Layer::Client => "client",
            Layer::Gateway => "gateway",
            Layer::Handler => "handler",
        };
        write!(f, "{}", s)
    }
}

/// One observed occurrence of a route at a specific source location.
///
/// Produced by the extractors, expanded by the resolver, and consumed
/// read-only by the indexes. The `raw_path` keeps whatever notation the
/// source used (`/orgs/${orgId}`, `/orgs/{orgId}`, `/orgs/:orgId`);
/// canonicalization happens when an index is built, never in place.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// File the route was observed in
    pub source_file: PathBuf,
    /// 1-based line of the observation
    pub source_line: usize,
    /// HTTP method of the route
    pub method: Method,
    /// Path as captured, parameter notation preserved
    pub raw_path: String,
    /// Path parameter names in path order, as captured
    pub path_params: ParamNames,
    /// Query parameter names split off the raw path, if any
    pub query_params: ParamNames,
    /// The source fragment the route was extracted from (for diagnostics)
    pub origin_snippet: String,
    /// True when the path was inferred (e.g. from a handler function name)
    /// rather than observed; inferred paths are candidates for gateway
    /// enrichment and are never trusted for parameter diffs.
    pub inferred_path: bool,
    /// Handler name this route is attributed to, when the layer knows one
    /// (the gateway table's `handler:` key, or the enclosing `def` in
    /// handler source). Links the gateway and handler layers for enrichment.
    pub handler_name: Option<String>,
    /// Parameter names the handler body actually extracts from the request
    /// (e.g. `event['pathParameters']['orgId']`). Handler layer only; diffed
    /// against the gateway template by the matcher.
    pub extracted_params: ParamNames,
}

impl RouteRecord {
    /// Create a record with empty parameter lists and no inference flag.
    pub fn new(
        source_file: impl Into<PathBuf>,
        source_line: usize,
        method: Method,
        raw_path: impl Into<String>,
        origin_snippet: impl Into<String>,
    ) -> Self {
        RouteRecord {
            source_file: source_file.into(),
            source_line,
            method,
            raw_path: raw_path.into(),
            path_params: ParamNames::new(),
            query_params: ParamNames::new(),
            origin_snippet: origin_snippet.into(),
            inferred_path: false,
            handler_name: None,
            extracted_params: ParamNames::new(),
        }
    }

    /// `file:line` reference for diagnostics.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}", self.source_file.display(), self.source_line)
    }

    /// Relative display path against a scan root, falling back to the full path.
    #[must_use]
    pub fn file_relative_to(&self, root: &Path) -> PathBuf {
        self.source_file
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.source_file.clone())
    }
}

/// Parse an HTTP verb as written in source (`get`, `POST`, ...).
///
/// Returns `None` for anything that is not one of the eight methods the
/// matcher reasons about, so extractors can skip unknown verbs instead of
/// fabricating records.
pub fn parse_method(s: &str) -> Option<Method> {
    match s.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "DELETE" => Some(Method::DELETE),
        "PATCH" => Some(Method::PATCH),
        "HEAD" => Some(Method::HEAD),
        "OPTIONS" => Some(Method::OPTIONS),
        "TRACE" => Some(Method::TRACE),
        _ => None,
    }
}
