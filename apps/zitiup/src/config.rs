//! Command-line configuration.
//!
//! Each setting is taken from its flag, then its environment variable, then
//! a built-in default. The release pipeline itself never reads the
//! environment; everything it needs is resolved here into [`Settings`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zitiup_release::{DEFAULT_FEED_URL, Target};

/// Environment variable overriding the binary directory.
pub const BIN_DIR_ENV: &str = "ZITIUP_BIN_DIR";

/// Environment variable overriding the release feed base URL.
pub const FEED_URL_ENV: &str = "ZITIUP_FEED_URL";

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Directory executables are installed into [default: ~/.ziti/bin]
    #[arg(long, global = true, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Base URL of the GitHub-style releases API
    #[arg(long, global = true, value_name = "URL")]
    pub feed_url: Option<String>,

    /// Target operating system token (linux, darwin, windows) [default: host]
    #[arg(long, global = true)]
    pub os: Option<String>,

    /// Target architecture token (amd64, arm64, arm) [default: host]
    #[arg(long, global = true)]
    pub arch: Option<String>,
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bin_dir: PathBuf,
    pub feed_url: String,
    pub target: Target,
}

impl Settings {
    /// Resolves settings from flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no binary directory is given and the home
    /// directory cannot be determined.
    pub fn resolve(args: &GlobalArgs) -> Result<Self> {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Resolves settings, reading environment variables through `env`.
    fn resolve_with(args: &GlobalArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bin_dir = match args.bin_dir.clone() {
            Some(dir) => dir,
            None => match non_empty(env(BIN_DIR_ENV)) {
                Some(dir) => PathBuf::from(dir),
                None => default_bin_dir()?,
            },
        };

        let feed_url = args
            .feed_url
            .clone()
            .or_else(|| non_empty(env(FEED_URL_ENV)))
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());

        let host = Target::host();
        let target = Target::new(
            args.os.clone().unwrap_or(host.os),
            args.arch.clone().unwrap_or(host.arch),
        );

        Ok(Self {
            bin_dir,
            feed_url,
            target,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `~/.ziti/bin`
fn default_bin_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory; pass --bin-dir")?;
    Ok(home.join(".ziti").join("bin"))
}
