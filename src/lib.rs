//! # apidrift
//!
//! **apidrift** is a static cross-layer API drift checker. It verifies that the
//! three descriptions of one HTTP API surface agree with each other:
//!
//! 1. **Client** — frontend call sites (`fetch`, axios-style clients, data
//!    hooks) in a TypeScript/JavaScript tree
//! 2. **Gateway** — a declarative route table (YAML or JSON)
//! 3. **Handler** — backend lambda-style handlers in a Python tree
//!
//! Each layer is the authoritative record of a different concern, and nothing
//! at runtime forces them to stay consistent. apidrift extracts routes from
//! all three, normalizes them onto one canonical path shape, and reports
//! every disagreement with a file/line location and a suggested fix.
//!
//! ## Architecture
//!
//! The library is organized into a pipeline of small modules:
//!
//! - **[`record`]** - The [`RouteRecord`] observation type shared by all layers
//! - **[`normalize`]** - Canonical path form; every parameter segment becomes
//!   the `{*}` placeholder so `/orgs/${orgId}` and `/orgs/{id}` compare equal
//! - **[`extract`]** - Three heuristic extractors (client call sites, gateway
//!   table, handler dispatch analysis) behind one [`RouteExtractor`] trait
//! - **[`resolve`]** - Template-literal variable resolution, including
//!   union-typed discriminator expansion into one record per alternative
//! - **[`index`]** - `(method, canonical path) → records` lookup per layer
//! - **[`matcher`]** - The cross-layer comparison passes (client↔gateway,
//!   gateway↔handler, parameter consistency)
//! - **[`orphan`]** - Handler routes no client calls, with exclusion patterns
//!   and a documented-routes escape hatch
//! - **[`report`]** - [`Mismatch`] findings, severity, and terminal output
//! - **[`config`]** - The optional validation config file
//! - **[`cli`]** - The `check` and `routes` commands
//!
//! ## Quick Start
//!
//! ```no_run
//! use apidrift::{
//!     extract::{extract_gateway_routes, GatewayRoutes},
//!     index::RouteIndex,
//!     record::Layer,
//! };
//!
//! let GatewayRoutes { records, .. } =
//!     extract_gateway_routes(std::path::Path::new("gateway.yaml")).expect("route table");
//! let index = RouteIndex::build(Layer::Gateway, records);
//! println!("{} gateway routes", index.len());
//! ```
//!
//! Or from the command line:
//!
//! ```bash
//! apidrift check \
//!     --frontend web/src \
//!     --gateway infra/gateway.yaml \
//!     --handlers services/handlers
//! ```
//!
//! ## Design Notes
//!
//! - **Static only.** apidrift never executes the code it analyzes and never
//!   sends a request. Extraction is regex-driven and heuristic; precision is
//!   tuned to keep false positives low enough that findings stay actionable.
//! - **Immutable observations.** Extraction produces records, indexing groups
//!   them, matching reads them. No pass mutates another pass's input, which
//!   keeps every comparison order-independent and the output deterministic.
//! - **Coroutine scanning.** File scans fan out over `may` coroutines; the
//!   worker count and stack size come from `APIDRIFT_SCAN_WORKERS` and
//!   `APIDRIFT_STACK_SIZE` (see [`runtime_config`]).

pub mod cli;
pub mod config;
pub mod extract;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod orphan;
pub mod record;
pub mod report;
pub mod resolve;
pub mod runtime_config;

pub use extract::{extract_gateway_routes, GatewayRoutes, RouteExtractor};
pub use index::{RouteIndex, RouteKey};
pub use matcher::cross_validate;
pub use normalize::{normalize, CanonicalPath};
pub use orphan::detect_orphans;
pub use record::{Layer, RouteRecord};
pub use report::{Mismatch, MismatchKind, Severity};
