//! # CLI Module
//!
//! Command-line interface for the apidrift checker.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Cross-validate the three layers and report drift:
//!
//! ```bash
//! apidrift check \
//!     --frontend web/src \
//!     --gateway infra/gateway.yaml \
//!     --handlers services/handlers
//! ```
//!
//! Options:
//! - `--config <FILE>` - Validation config (exclusions, documented routes, scope)
//! - `--strict` - Fail on warnings too, not just errors
//! - `--errors-only` - Hide warnings in the output
//!
//! Exit code is non-zero whenever any error-severity mismatch exists;
//! warnings alone exit zero unless `--strict` is given.
//!
//! ### `routes`
//!
//! Dump the extracted, normalized routes per layer — useful when debugging
//! why a route is or is not being matched:
//!
//! ```bash
//! apidrift routes --frontend web/src --gateway infra/gateway.yaml \
//!     --handlers services/handlers --layer client
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands, LayerArg};
