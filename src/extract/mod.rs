//! Route extraction: three heuristic parsers, one interface.
//!
//! Each variant scans its own layer's source representation and produces
//! [`RouteRecord`]s. Extraction tolerates unparseable fragments by skipping
//! them — a single odd file never aborts a scan — but a missing layer root
//! or a required layer yielding zero files is structural and fatal, because
//! an empty layer would manufacture a flood of false "not found" findings
//! downstream.

mod client;
mod enrich;
mod gateway;
mod handler;
mod source;

pub use client::ClientCallExtractor;
pub use enrich::enrich_handler_routes;
pub use gateway::{extract_gateway_routes, GatewayRoutes};
pub use handler::HandlerRouteExtractor;
pub use source::{scan_files, SourceTree};

use crate::record::{Layer, RouteRecord};
use crate::resolve;
use crate::runtime_config::RuntimeConfig;
use std::path::Path;
use tracing::info;

/// One heuristic per-file route parser.
///
/// Implementations must tolerate unparseable fragments by skipping them,
/// never panicking or aborting the file.
pub trait RouteExtractor: Send + Sync {
    /// Which layer this extractor describes
    fn layer(&self) -> Layer;
    /// File extensions the extractor understands
    fn extensions(&self) -> &'static [&'static str];
    /// Extract every route record from one file's source
    fn extract_file(&self, file: &Path, source: &str) -> Vec<RouteRecord>;
}

/// Extract client call-site routes from a frontend source tree.
///
/// Union-typed discriminator expansion runs per file while the source is in
/// hand, so the returned records are already concrete.
pub fn extract_client_routes(
    root: &Path,
    scope: Option<&str>,
    config: RuntimeConfig,
) -> anyhow::Result<Vec<RouteRecord>> {
    let files = SourceTree::new(root)
        .with_scope(scope.map(str::to_string))
        .files_with_extensions(ClientCallExtractor.extensions())?;
    if files.is_empty() {
        anyhow::bail!(
            "client layer {} contains no frontend source files",
            root.display()
        );
    }
    let records = scan_files(files, config, |file, source| {
        ClientCallExtractor
            .extract_file(file, source)
            .iter()
            .flat_map(|record| resolve::resolve(record, source))
            .collect()
    });
    info!(
        layer = %Layer::Client,
        records = records.len(),
        "Client extraction complete"
    );
    Ok(records)
}

/// Extract handler routes from a backend source tree.
pub fn extract_handler_routes(
    root: &Path,
    scope: Option<&str>,
    config: RuntimeConfig,
) -> anyhow::Result<Vec<RouteRecord>> {
    let files = SourceTree::new(root)
        .with_scope(scope.map(str::to_string))
        .files_with_extensions(HandlerRouteExtractor.extensions())?;
    if files.is_empty() {
        anyhow::bail!(
            "handler layer {} contains no handler source files",
            root.display()
        );
    }
    let records = scan_files(files, config, |file, source| {
        HandlerRouteExtractor.extract_file(file, source)
    });
    info!(
        layer = %Layer::Handler,
        records = records.len(),
        "Handler extraction complete"
    );
    Ok(records)
}
