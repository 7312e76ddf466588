#![warn(clippy::pedantic)]

//! # zitiup
//!
//! Installs and upgrades OpenZiti executables from their GitHub releases.
//!
//! ## Subcommands
//!
//! - `install` - Install an application into the binary directory
//! - `upgrade` - Replace an installed application with another release
//! - `latest` - Print the newest released version of an application
//!
//! ## Examples
//!
//! ```bash
//! zitiup install ziti
//! zitiup install ziti-edge-tunnel 1.2.3 --bin-dir /usr/local/bin
//! zitiup upgrade ziti
//! zitiup latest ziti
//! ```

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{install, latest};
use config::{GlobalArgs, Settings};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use zitiup_release::ReleaseError;

/// OpenZiti release installer.
#[derive(Parser)]
#[command(
    name = "zitiup",
    author,
    version,
    about = "Install and upgrade OpenZiti executables",
    after_help = "\
ENVIRONMENT VARIABLES:
    ZITIUP_BIN_DIR          Install directory (default: ~/.ziti/bin)
    ZITIUP_FEED_URL         Releases API base URL (default: https://api.github.com/repos/openziti)
    RUST_LOG                Overrides the log filter chosen by -v/--quiet"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the zitiup CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install an application.
    ///
    /// Downloads the release built for the target platform and extracts the
    /// executable into the binary directory. Fails if it is already there.
    Install(install::InstallArgs),

    /// Upgrade an installed application.
    ///
    /// Like install, but replaces an existing executable.
    Upgrade(install::InstallArgs),

    /// Print the newest released version of an application.
    Latest(latest::LatestArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error and returns the process exit code.
///
/// A `404` from the release feed usually means a mistyped application name,
/// so it gets an extra hint.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    if let Some(err) = e.downcast_ref::<ReleaseError>()
        && err.is_not_found()
    {
        eprintln!("Hint: check the application name and --feed-url");
    }
    1
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = Settings::resolve(&cli.global)?;
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Install(args) => install::execute(&args, &settings, false).await,
        Commands::Upgrade(args) => install::execute(&args, &settings, true).await,
        Commands::Latest(args) => latest::execute(&args, &settings).await,
    }
}
