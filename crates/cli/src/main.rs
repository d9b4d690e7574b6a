//! `moveportal`: call the move office portal APIs from the command line.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

/// Environment variable controlling log output.
const LOG_ENV: &str = "MOVEPORTAL_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "moveportal",
    version,
    about = "Call the move office portal APIs through their Swagger documents"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the operations a surface exposes
    Operations(commands::operations::OperationsArgs),
    /// Invoke an operation and print its (normalized) response
    Call(commands::call::CallArgs),
}

fn main() {
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run(std::env::args().collect()));
    std::process::exit(code);
}

async fn run(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Operations(args)) => {
                commands::operations::run(cli.config.as_deref(), args).await
            }
            Some(Commands::Call(args)) => commands::call::run(cli.config.as_deref(), args).await,
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing() {
    let filter = log_filter(std::env::var(LOG_ENV).ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

/// MOVEPORTAL_LOG is either a plain level ("debug") applied to this binary and
/// the core crate, or a full tracing filter spec like "moveportal_core=trace,reqwest=debug".
fn log_filter(setting: Option<&str>) -> String {
    let crate_root = module_path!();
    match setting {
        Some(level) if is_plain_level(level) => {
            format!("{crate_root}={level},moveportal_core={level}")
        }
        Some(spec) if !spec.trim().is_empty() => spec.to_string(),
        _ => format!("{crate_root}=warn,moveportal_core=warn"),
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use moveportal_core::Surface;

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(None), "moveportal=warn,moveportal_core=warn");
        assert_eq!(
            log_filter(Some("debug")),
            "moveportal=debug,moveportal_core=debug"
        );
        assert_eq!(log_filter(Some("reqwest=trace")), "reqwest=trace");
        assert_eq!(log_filter(Some(" ")), "moveportal=warn,moveportal_core=warn");
    }

    #[test]
    fn test_call_arguments_parse() {
        let cli = Cli::try_parse_from([
            "moveportal",
            "--config",
            "portal.toml",
            "call",
            "ghc",
            "shipments.getShipment",
            "-p",
            "shipmentID=abcd-1234",
            "--cookie",
            "masked_gorilla_csrf=tok",
            "--schema-key",
            "shipment",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("portal.toml")));
        let Some(Commands::Call(args)) = cli.command else {
            unreachable!("expected the call subcommand");
        };
        assert_eq!(args.surface, Surface::Ghc);
        assert_eq!(args.operation, "shipments.getShipment");
        assert_eq!(args.params, vec![("shipmentID".to_string(), "abcd-1234".to_string())]);
        assert_eq!(args.schema_key.as_deref(), Some("shipment"));
        assert!(!args.raw);
        assert!(!args.no_normalize);
    }

    #[test]
    fn test_unknown_surface_is_rejected() {
        assert!(Cli::try_parse_from(["moveportal", "operations", "support"]).is_err());
        assert!(Cli::try_parse_from(["moveportal", "call", "ghc", "x.y", "-p", "novalue"]).is_err());
        assert!(
            Cli::try_parse_from(["moveportal", "call", "ghc", "x.y", "--raw", "--no-normalize"])
                .is_err()
        );
    }
}
