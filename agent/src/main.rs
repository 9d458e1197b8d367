mod bridge;
mod handler;
mod http;
mod io;
mod protocol;
mod state;

use std::path::PathBuf;

use sofatracker_core::config::{TrackerConfig, API_BASE_ENV};
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    eprintln!("Usage: sofatracker-agent --stdio [--config <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio           Run in stdio mode (NDJSON over stdin/stdout)");
    eprintln!("  --config <path>   Read settings from <path> instead of the default config.json");
    eprintln!("  --version         Print version and exit");
    eprintln!("  --help            Print this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {API_BASE_ENV}   Override the stats backend URL");
    eprintln!("  RUST_LOG               Log filter (default: info)");
}

/// Load the config from `--config <path>` if given, else the default location.
fn load_config(args: &[String]) -> anyhow::Result<TrackerConfig> {
    match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
            Ok(TrackerConfig::load_from(&path).with_env_overrides())
        }
        None => Ok(TrackerConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--version" => {
            println!("sofatracker-agent {}", VERSION);
            Ok(())
        }
        "--help" => {
            print_usage();
            Ok(())
        }
        "--stdio" => {
            // Configure tracing to stderr so it doesn't interfere with the protocol on stdout
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .init();

            let config = load_config(&args[2..])?;
            info!("sofatracker-agent {} starting in stdio mode", VERSION);
            io::stdio::run_stdio_loop(config).await
        }
        other => {
            eprintln!("Unknown option: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }
}
