//! Mismatch records and console reporting.
//!
//! A [`Mismatch`] is the designed output of the matching engine, not a tool
//! error: the run continues after every one. Mismatches are produced only by
//! the matcher and the orphan detector, consumed only by the reporter, and
//! never mutated afterward.

use std::path::PathBuf;

/// Severity level for a mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - a concretely broken route; fails the run
    Error,
    /// Warning - likely drift, possibly deliberate
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The category of drift a mismatch reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// Client calls a route the gateway does not declare at all
    RouteNotFound,
    /// Client calls a declared path with a method the gateway does not accept
    MethodMismatch,
    /// Gateway declares a route no handler implements
    MissingHandler,
    /// Client and handler disagree on path parameter names for one route
    ParameterMismatch,
    /// Handler route with no client call site
    OrphanedRoute,
    /// Gateway and handler declare the same route with different parameter names
    PathParameterNaming,
    /// Handler extracts a path parameter the gateway template does not declare
    LambdaParamExtractionMismatch,
}

impl MismatchKind {
    /// Stable snake_case identifier used in reports and tests
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::RouteNotFound => "route_not_found",
            MismatchKind::MethodMismatch => "method_mismatch",
            MismatchKind::MissingHandler => "missing_handler",
            MismatchKind::ParameterMismatch => "parameter_mismatch",
            MismatchKind::OrphanedRoute => "orphaned_route",
            MismatchKind::PathParameterNaming => "path_parameter_naming",
            MismatchKind::LambdaParamExtractionMismatch => "lambda_param_extraction_mismatch",
        }
    }
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `file:line` reference into one of the scanned layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub file: PathBuf,
    pub line: usize,
}

impl SourceRef {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        SourceRef {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// One cross-layer drift finding
#[derive(Debug, Clone)]
pub struct Mismatch {
    /// Type of drift
    pub kind: MismatchKind,
    /// Severity of the finding
    pub severity: Severity,
    /// Up to two layer file/line references (the observing side first)
    pub locations: Vec<SourceRef>,
    /// Human-readable description of the drift
    pub message: String,
    /// Optional suggestion for how to fix it
    pub suggestion: Option<String>,
}

impl Mismatch {
    /// Create a new mismatch with no locations or suggestion
    pub fn new(kind: MismatchKind, severity: Severity, message: impl Into<String>) -> Self {
        Mismatch {
            kind,
            severity,
            locations: Vec::new(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach a source location (at most two are meaningful)
    #[must_use]
    pub fn with_location(mut self, file: impl Into<PathBuf>, line: usize) -> Self {
        self.locations.push(SourceRef::new(file, line));
        self
    }

    /// Add a suggestion for fixing the drift
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Primary location, when one was attached
    #[must_use]
    pub fn primary_location(&self) -> Option<&SourceRef> {
        self.locations.first()
    }
}

/// True when any error-severity mismatch exists
#[must_use]
pub fn has_errors(mismatches: &[Mismatch]) -> bool {
    mismatches.iter().any(|m| m.severity == Severity::Error)
}

/// Process exit code for a finished run.
///
/// Non-zero whenever any error-severity mismatch exists; warnings alone exit
/// zero unless strict mode is requested.
#[must_use]
pub fn exit_code(mismatches: &[Mismatch], strict: bool) -> i32 {
    if has_errors(mismatches) || (strict && !mismatches.is_empty()) {
        1
    } else {
        0
    }
}

/// Print mismatches grouped by severity
pub fn print_mismatches(mismatches: &[Mismatch]) {
    if mismatches.is_empty() {
        println!("✅ No API drift found!");
        return;
    }

    let errors: Vec<_> = mismatches
        .iter()
        .filter(|m| m.severity == Severity::Error)
        .collect();
    let warnings: Vec<_> = mismatches
        .iter()
        .filter(|m| m.severity == Severity::Warning)
        .collect();

    println!("\n📋 Drift Results:");
    println!("   {} error(s), {} warning(s)\n", errors.len(), warnings.len());

    if !errors.is_empty() {
        println!("❌ Errors (must fix):");
        for m in &errors {
            print_one(m);
        }
        println!();
    }

    if !warnings.is_empty() {
        println!("⚠️  Warnings (should review):");
        for m in &warnings {
            print_one(m);
        }
        println!();
    }
}

fn print_one(m: &Mismatch) {
    let where_ = m
        .locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ↔ ");
    println!("   [{}] {}", m.kind, where_);
    println!("      {}", m.message);
    if let Some(suggestion) = &m.suggestion {
        println!("      💡 Suggestion: {}", suggestion);
    }
}
