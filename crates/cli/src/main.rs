//! AntennaFlow CLI: the main entry point.
//!
//! Commands:
//! - `design`: Run a request through the full pipeline and print the result
//! - `prompt`: Print the prompt a request would send, without calling a model
//! - `doctor`: Check configuration and provider reachability
//! - `init`: Write a starter config file
//! - `materials`: Print the built-in materials table

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "antennaflow",
    about = "AntennaFlow — antenna design from plain-language requests",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Design an antenna from a free-text request
    Design {
        /// The request, e.g. "dipole for Bluetooth at 2.4 GHz"
        request: String,

        /// Correlation id echoed into the prompt and the response
        #[arg(long)]
        request_id: Option<String>,

        /// Drive the configured bridge instead of the mock session
        #[arg(long)]
        real_backend: bool,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,
    },

    /// Print the prompt for a request without calling a model
    Prompt {
        request: String,

        #[arg(long)]
        request_id: Option<String>,
    },

    /// Diagnose configuration and provider reachability
    Doctor {
        /// Skip the provider reachability check
        #[arg(long)]
        offline: bool,
    },

    /// Write a starter config file to ~/.antennaflow/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List the built-in materials
    Materials,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    load_dotenv();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Design {
            request,
            request_id,
            real_backend,
            pretty,
        } => commands::design::run(&request, request_id.as_deref(), real_backend, pretty).await?,
        Commands::Prompt {
            request,
            request_id,
        } => commands::prompt::run(&request, request_id.as_deref())?,
        Commands::Doctor { offline } => commands::doctor::run(offline).await?,
        Commands::Init { force } => commands::init::run(force)?,
        Commands::Materials => commands::materials::run()?,
    }

    Ok(())
}

/// `DOTENV_PATH` if set, else `.env.local` then `.env`. Existing process
/// variables are never overridden.
fn load_dotenv() {
    if let Some(path) = std::env::var_os("DOTENV_PATH").map(PathBuf::from) {
        if let Err(e) = dotenvy::from_path(&path) {
            eprintln!("warning: could not load {}: {e}", path.display());
        }
        return;
    }
    for name in [".env.local", ".env"] {
        let _ = dotenvy::from_filename(name);
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    // Logs go to stderr; stdout carries the command output.
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
