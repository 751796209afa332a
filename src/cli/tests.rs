//! Unit tests for CLI commands

use crate::cli::{Cli, Commands, LayerArg};
use clap::Parser;

#[test]
fn test_parse_check_command() {
    let cli = Cli::try_parse_from([
        "apidrift",
        "check",
        "--frontend",
        "web/src",
        "--gateway",
        "infra/gateway.yaml",
        "--handlers",
        "services/handlers",
    ])
    .unwrap();

    match cli.command {
        Commands::Check {
            frontend,
            gateway,
            handlers,
            config,
            strict,
            errors_only,
        } => {
            assert_eq!(frontend.to_string_lossy(), "web/src");
            assert_eq!(gateway.to_string_lossy(), "infra/gateway.yaml");
            assert_eq!(handlers.to_string_lossy(), "services/handlers");
            assert!(config.is_none());
            assert!(!strict);
            assert!(!errors_only);
        }
        _ => panic!("Expected Check command"),
    }
}

#[test]
fn test_parse_check_flags() {
    let cli = Cli::try_parse_from([
        "apidrift",
        "check",
        "--frontend",
        "fe",
        "--gateway",
        "gw.json",
        "--handlers",
        "be",
        "--config",
        "apidrift.yaml",
        "--strict",
        "--errors-only",
    ])
    .unwrap();

    match cli.command {
        Commands::Check {
            config,
            strict,
            errors_only,
            ..
        } => {
            assert_eq!(
                config.as_deref().map(|p| p.to_string_lossy().into_owned()),
                Some("apidrift.yaml".to_string())
            );
            assert!(strict);
            assert!(errors_only);
        }
        _ => panic!("Expected Check command"),
    }
}

#[test]
fn test_parse_routes_with_layer() {
    let cli = Cli::try_parse_from([
        "apidrift",
        "routes",
        "--frontend",
        "fe",
        "--gateway",
        "gw.yaml",
        "--handlers",
        "be",
        "--layer",
        "gateway",
    ])
    .unwrap();

    match cli.command {
        Commands::Routes { layer, .. } => assert_eq!(layer, Some(LayerArg::Gateway)),
        _ => panic!("Expected Routes command"),
    }
}

#[test]
fn test_check_requires_all_layer_roots() {
    let result = Cli::try_parse_from(["apidrift", "check", "--frontend", "fe"]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_layer_rejected() {
    let result = Cli::try_parse_from([
        "apidrift",
        "routes",
        "--frontend",
        "fe",
        "--gateway",
        "gw.yaml",
        "--handlers",
        "be",
        "--layer",
        "backend",
    ]);
    assert!(result.is_err());
}
