//! Install and upgrade commands for the zitiup CLI.
//!
//! ## Usage
//!
//! ```bash
//! zitiup install ziti              # Install the latest release
//! zitiup install ziti 1.1.3        # Install a specific version
//! zitiup upgrade ziti-edge-tunnel  # Replace an installed binary with the latest release
//! ```

use anyhow::{Result, bail};
use clap::Args;
use zitiup_release::{InstallRequest, Installer};

use crate::config::Settings;

/// Arguments for the install and upgrade commands.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Application to install (e.g. ziti, ziti-edge-tunnel).
    pub app: String,

    /// Version to install (e.g. "1.1.3", "v1.1.3" or "latest").
    #[clap(default_value = "latest")]
    pub version: String,

    /// Release feed to use instead of the one known for the application.
    #[clap(long)]
    pub feed: Option<String>,
}

impl InstallArgs {
    /// Builds the pipeline request for these arguments.
    #[must_use]
    pub fn request(&self, settings: &Settings) -> InstallRequest {
        let request = InstallRequest::new(&self.app, &settings.bin_dir)
            .with_version(&self.version)
            .with_target(settings.target.clone());
        match &self.feed {
            Some(feed) => request.with_feed(feed),
            None => request,
        }
    }
}

/// Executes the install command, or the upgrade command when `upgrade` is set.
///
/// A plain install refuses to overwrite an executable that is already in
/// the binary directory.
///
/// # Errors
///
/// Returns an error if the application name is not a plain file name, if
/// the application is already installed (install only) or if any stage of
/// the release pipeline fails.
pub async fn execute(args: &InstallArgs, settings: &Settings, upgrade: bool) -> Result<()> {
    let request = args.request(settings);
    request.validate()?;
    let binary_path = request.binary_path();

    if !upgrade && binary_path.exists() {
        bail!(
            "{} is already installed at {}; use 'zitiup upgrade {}' to replace it",
            args.app,
            binary_path.display(),
            args.app
        );
    }

    let installer = Installer::new(&settings.feed_url)?;
    let outcome = installer.install(&request, upgrade).await?;

    let verb = if upgrade { "Upgraded" } else { "Installed" };
    println!(
        "{verb} {} {} to {}",
        args.app,
        outcome.installed_version,
        outcome.installed_path.display()
    );
    Ok(())
}
