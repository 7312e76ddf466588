#![warn(clippy::pedantic)]
//! Release Acquisition and Installation for the zitiup Toolchain Manager
//!
//! This crate turns a logical application name into an executable on disk.
//! It resolves a release from a GitHub-style release feed, picks the asset
//! built for the target platform, downloads it and extracts the executable
//! into a binary directory.
//!
//! ## Pipeline
//!
//! ```text
//! InstallRequest → resolve release → select asset → download → extract → chmod 0755
//! ```
//!
//! Each stage is exposed on its own, and [`Installer`] chains them:
//!
//! ```rust,no_run
//! use zitiup_release::{InstallRequest, Installer, DEFAULT_FEED_URL};
//!
//! # async fn run() -> zitiup_release::Result<()> {
//! let installer = Installer::new(DEFAULT_FEED_URL)?;
//! let request = InstallRequest::new("ziti", "/usr/local/bin").with_version("1.1.3");
//! let outcome = installer.install(&request, false).await?;
//! println!("installed {} at {}", outcome.installed_version, outcome.installed_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`version`] - Tolerant semantic version parsing and ordering
//! - [`archive`] - ZIP and tar.gz extraction with path containment checks
//! - [`http`] - Timeout, retry and redirect policy shared by every request
//! - [`download`] - Streaming asset download
//! - [`feed`] - Release feed client and version resolution
//! - [`apps`] - Known applications and their tag conventions
//! - [`asset`] - Platform asset selection
//! - [`platform`] - Host platform detection
//! - [`install`] - The install pipeline
//! - [`error`] - Error types
//!
//! ## Configuration
//!
//! Nothing in this crate reads the environment. Feed location, HTTP policy
//! and install target are passed in explicitly, so every stage can be tested
//! against a mock server and a scratch directory.

pub mod apps;
pub mod archive;
pub mod asset;
pub mod download;
pub mod error;
pub mod feed;
pub mod http;
pub mod install;
pub mod platform;
pub mod version;

pub use archive::{ArchiveFormat, extract, set_executable_permissions};
pub use asset::select_asset;
pub use download::Downloader;
pub use error::{ReleaseError, Result};
pub use feed::{AssetRef, DEFAULT_FEED_URL, ReleaseDescriptor, ReleaseFeed};
pub use http::HttpPolicy;
pub use install::{InstallOutcome, InstallRequest, Installer};
pub use platform::Target;
pub use version::{RequestedVersion, compare, parse_tolerant};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
