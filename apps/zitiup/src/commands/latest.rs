//! Latest command for the zitiup CLI.
//!
//! Prints the highest released version of an application without
//! installing anything.

use anyhow::Result;
use clap::Args;
use zitiup_release::{HttpPolicy, ReleaseFeed, apps::feed_for};

use crate::config::Settings;

/// Arguments for the latest command.
#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Application to look up.
    pub app: String,

    /// Release feed to use instead of the one known for the application.
    #[clap(long)]
    pub feed: Option<String>,
}

/// Executes the latest command.
///
/// # Errors
///
/// Returns an error if the release feed cannot be queried or holds no
/// valid releases.
pub async fn execute(args: &LatestArgs, settings: &Settings) -> Result<()> {
    let feed_name = args.feed.as_deref().unwrap_or_else(|| feed_for(&args.app));
    let feed = ReleaseFeed::new(&settings.feed_url, HttpPolicy::feed())?;
    let release = feed.resolve_latest(feed_name).await?;
    println!("{}", release.version);
    Ok(())
}
