use crate::{
    config::ValidationConfig,
    extract::{
        enrich_handler_routes, extract_client_routes, extract_gateway_routes,
        extract_handler_routes,
    },
    index::RouteIndex,
    matcher::cross_validate,
    orphan::{compile_exclusions, detect_orphans},
    record::Layer,
    report::{exit_code, print_mismatches, Severity},
    runtime_config::RuntimeConfig,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Command-line interface for apidrift
///
/// Provides commands for cross-validating the three API-surface layers and
/// for inspecting what the extractors recovered from each one.
#[derive(Parser)]
#[command(name = "apidrift")]
#[command(about = "Static cross-layer API drift checker", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands for apidrift
#[derive(Subcommand)]
pub enum Commands {
    /// Cross-validate client calls, gateway declarations, and handlers
    Check {
        /// Frontend source tree containing client call sites
        #[arg(long)]
        frontend: PathBuf,

        /// Gateway route table file (YAML or JSON)
        #[arg(long)]
        gateway: PathBuf,

        /// Backend handler source tree
        #[arg(long)]
        handlers: PathBuf,

        /// Validation config file (exclusions, documented routes, scope)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Exit non-zero on warnings as well as errors
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Show only errors (hide warnings)
        #[arg(long, default_value_t = false)]
        errors_only: bool,
    },
    /// Dump extracted, normalized routes per layer
    Routes {
        /// Frontend source tree containing client call sites
        #[arg(long)]
        frontend: PathBuf,

        /// Gateway route table file (YAML or JSON)
        #[arg(long)]
        gateway: PathBuf,

        /// Backend handler source tree
        #[arg(long)]
        handlers: PathBuf,

        /// Validation config file (only `scope` is honored here)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Limit output to one layer
        #[arg(long, value_enum)]
        layer: Option<LayerArg>,
    },
}

/// Layer selector for the `routes` subcommand
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayerArg {
    Client,
    Gateway,
    Handler,
}

impl LayerArg {
    fn matches(self, layer: Layer) -> bool {
        matches!(
            (self, layer),
            (LayerArg::Client, Layer::Client)
                | (LayerArg::Gateway, Layer::Gateway)
                | (LayerArg::Handler, Layer::Handler)
        )
    }
}

/// Execute the CLI command provided by the user, returning the process exit
/// code.
///
/// # Errors
///
/// Returns an error if a layer root is missing, a required layer yields no
/// source files, the gateway table or config fails to parse, or an exclusion
/// pattern fails to compile. Mismatch findings are not errors; they are the
/// output.
pub fn run_cli() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Check {
            frontend,
            gateway,
            handlers,
            config,
            strict,
            errors_only,
        } => run_check(frontend, gateway, handlers, config.as_deref(), *strict, *errors_only),
        Commands::Routes {
            frontend,
            gateway,
            handlers,
            config,
            layer,
        } => run_routes(frontend, gateway, handlers, config.as_deref(), *layer),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ValidationConfig> {
    match path {
        Some(p) => ValidationConfig::load(p),
        None => Ok(ValidationConfig::default()),
    }
}

/// Build all three indexes, then match. The build is a hard barrier: no
/// comparison runs against a partially built index, since that would bias
/// every pass with false positives.
fn build_indexes(
    frontend: &Path,
    gateway: &Path,
    handlers: &Path,
    scope: Option<&str>,
) -> anyhow::Result<(RouteIndex, RouteIndex, RouteIndex, crate::extract::GatewayRoutes)> {
    let runtime = RuntimeConfig::from_env();

    let client_records = extract_client_routes(frontend, scope, runtime)?;
    let gateway_table = extract_gateway_routes(gateway)?;
    if gateway_table.records.is_empty() {
        anyhow::bail!("gateway route table {} declares no routes", gateway.display());
    }
    let handler_records = extract_handler_routes(handlers, scope, runtime)?;
    let handler_records = enrich_handler_routes(handler_records, &gateway_table.records);

    let client_index = RouteIndex::build(Layer::Client, client_records);
    let gateway_index = RouteIndex::build(Layer::Gateway, gateway_table.records.clone());
    let handler_index = RouteIndex::build(Layer::Handler, handler_records);
    Ok((client_index, gateway_index, handler_index, gateway_table))
}

fn run_check(
    frontend: &Path,
    gateway: &Path,
    handlers: &Path,
    config: Option<&Path>,
    strict: bool,
    errors_only: bool,
) -> anyhow::Result<i32> {
    let config = load_config(config)?;
    let exclusions = compile_exclusions(&config.exclusions)?;

    let (client_index, gateway_index, handler_index, gateway_table) =
        build_indexes(frontend, gateway, handlers, config.scope.as_deref())?;

    let mut documented = gateway_table.documented;
    documented.extend(config.documented_keys());

    let mut mismatches = cross_validate(&client_index, &gateway_index, &handler_index);
    mismatches.extend(detect_orphans(
        &handler_index,
        &client_index,
        &exclusions,
        &documented,
    ));

    if errors_only {
        let errors: Vec<_> = mismatches
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .cloned()
            .collect();
        print_mismatches(&errors);
    } else {
        print_mismatches(&mismatches);
    }

    // Exit policy always considers the full list, including hidden warnings.
    Ok(exit_code(&mismatches, strict))
}

fn run_routes(
    frontend: &Path,
    gateway: &Path,
    handlers: &Path,
    config: Option<&Path>,
    layer: Option<LayerArg>,
) -> anyhow::Result<i32> {
    let config = load_config(config)?;
    let (client_index, gateway_index, handler_index, _) =
        build_indexes(frontend, gateway, handlers, config.scope.as_deref())?;

    for index in [&client_index, &gateway_index, &handler_index] {
        if layer.map(|l| l.matches(index.layer())).unwrap_or(true) {
            dump_index(index);
        }
    }
    Ok(0)
}

/// Print one layer's routes to stdout
fn dump_index(index: &RouteIndex) {
    println!("[{}] {} route(s)", index.layer(), index.len());
    for ((method, path), records) in index.iter_sorted() {
        println!("[route] {method} {path} ({} record(s))", records.len());
        for record in records {
            println!("        {} | {}", record.location(), record.origin_snippet);
        }
    }
}
