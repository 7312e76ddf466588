//! Install orchestration.
//!
//! [`Installer::install`] runs the whole pipeline for one application:
//! resolve the release, pick the platform asset, download it next to the
//! binary directory, extract the executable under its final name, remove the
//! staging archive and mark the binary executable. Each stage is a hard stop
//! on error; nothing is rolled back.

use std::path::{Component, Path, PathBuf};

use semver::Version;
use tracing::{debug, info, warn};

use crate::apps::{TagRule, feed_for};
use crate::archive::{self, ArchiveFormat};
use crate::asset::select_asset;
use crate::download::Downloader;
use crate::error::{ReleaseError, Result};
use crate::feed::{ReleaseDescriptor, ReleaseFeed};
use crate::http::HttpPolicy;
use crate::platform::Target;
use crate::version::{LATEST, RequestedVersion};

/// What to install and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Logical application name; also the installed executable name.
    pub app_name: String,
    /// Release feed publishing the application.
    pub feed_name: String,
    /// Target operating system token.
    pub target_os: String,
    /// Target architecture token.
    pub target_arch: String,
    /// Directory the executable is installed into.
    pub bin_dir: PathBuf,
    /// A version, or empty / `latest` for the newest release.
    pub version: String,
}

impl InstallRequest {
    /// Creates a request for the latest release of `app` for the host platform.
    ///
    /// The feed name comes from [`KNOWN_APPS`](crate::apps::KNOWN_APPS).
    #[must_use]
    pub fn new(app: impl Into<String>, bin_dir: impl Into<PathBuf>) -> Self {
        let app_name = app.into();
        let host = Target::host();
        Self {
            feed_name: feed_for(&app_name).to_string(),
            app_name,
            target_os: host.os,
            target_arch: host.arch,
            bin_dir: bin_dir.into(),
            version: LATEST.to_string(),
        }
    }

    /// Requests `version` instead of the latest release.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Installs the build for `target` instead of the host.
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target_os = target.os;
        self.target_arch = target.arch;
        self
    }

    /// Queries `feed` instead of the application's known feed.
    #[must_use]
    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed_name = feed.into();
        self
    }

    /// Checks that the application name is a single normal file name, so
    /// every path derived from it stays inside the binary directory.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidAppName`] for an empty name, `.`, `..`,
    /// or a name containing a path separator.
    pub fn validate(&self) -> Result<()> {
        let name = self.app_name.as_str();
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if single_normal && !name.contains(['/', '\\']) {
            Ok(())
        } else {
            Err(ReleaseError::InvalidAppName {
                app: self.app_name.clone(),
            })
        }
    }

    /// The target platform of this request.
    #[must_use]
    pub fn target(&self) -> Target {
        Target::new(self.target_os.clone(), self.target_arch.clone())
    }

    /// File name of the installed executable.
    #[must_use]
    pub fn binary_name(&self) -> String {
        format!("{}{}", self.app_name, self.target().executable_extension())
    }

    /// Full path of the installed executable.
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        self.bin_dir.join(self.binary_name())
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Where the executable was written.
    pub installed_path: PathBuf,
    /// Version of the release it came from.
    pub installed_version: Version,
}

/// Runs installs against one release feed.
#[derive(Debug, Clone)]
pub struct Installer {
    feed: ReleaseFeed,
    downloader: Downloader,
}

impl Installer {
    /// Creates an installer for the feed at `base_url` with the default policies.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Client`] if an HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_policies(base_url, HttpPolicy::feed(), HttpPolicy::download())
    }

    /// Creates an installer with explicit feed and download policies.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Client`] if an HTTP client cannot be built.
    pub fn with_policies(
        base_url: impl Into<String>,
        feed_policy: HttpPolicy,
        download_policy: HttpPolicy,
    ) -> Result<Self> {
        Ok(Self {
            feed: ReleaseFeed::new(base_url, feed_policy)?,
            downloader: Downloader::new(download_policy)?,
        })
    }

    /// The release feed this installer queries.
    #[must_use]
    pub fn feed(&self) -> &ReleaseFeed {
        &self.feed
    }

    /// Resolves the release `req` asks for without installing it.
    ///
    /// An explicit version is spelled according to the application's
    /// [`TagRule`] before it is looked up.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Parse`] for an invalid version before any
    /// request is made, otherwise any error of the feed query.
    pub async fn resolve(&self, req: &InstallRequest) -> Result<ReleaseDescriptor> {
        match RequestedVersion::parse(&req.version)? {
            RequestedVersion::Latest => self.feed.resolve_latest(&req.feed_name).await,
            RequestedVersion::Exact(version) => {
                let tag = TagRule::for_app(&req.app_name).apply(&version);
                self.feed.resolve_exact(&req.feed_name, &tag).await
            }
        }
    }

    /// Installs the executable described by `req`.
    ///
    /// With `upgrade` set, an existing executable at the destination is
    /// removed once the new archive has been downloaded.
    ///
    /// # Errors
    ///
    /// [`ReleaseError::InvalidAppName`] before anything else is done;
    /// any error from resolution, asset selection, download or extraction;
    /// [`ReleaseError::UnsupportedArchive`] if the asset is not a ZIP or
    /// tarball; [`ReleaseError::BinaryNotFound`] if the archive does not hold
    /// exactly one matching executable.
    pub async fn install(&self, req: &InstallRequest, upgrade: bool) -> Result<InstallOutcome> {
        req.validate()?;
        let release = self.resolve(req).await?;
        let url = select_asset(&release, &req.app_name, &req.target_os, &req.target_arch)?;
        let format =
            ArchiveFormat::from_name(url).ok_or_else(|| ReleaseError::UnsupportedArchive {
                url: url.to_string(),
            })?;

        let binary_name = req.binary_name();
        let binary_path = req.bin_dir.join(&binary_name);
        let staging = req
            .bin_dir
            .join(format!("{binary_name}{}", format.extension()));

        tokio::fs::create_dir_all(&req.bin_dir)
            .await
            .map_err(|e| ReleaseError::io("create directory", &req.bin_dir, e))?;

        info!(app = %req.app_name, version = %release.version, url, "downloading release");
        self.downloader.download(url, &staging).await?;

        if upgrade {
            remove_previous(&binary_path).await;
        }

        let count = extract_binary(
            format,
            staging.clone(),
            req.bin_dir.clone(),
            binary_filter(&req.app_name, &binary_name),
        )
        .await?;
        if count != 1 {
            return Err(ReleaseError::BinaryNotFound {
                binary: binary_name,
                archive: staging,
                count,
            });
        }

        tokio::fs::remove_file(&staging)
            .await
            .map_err(|e| ReleaseError::io("remove", &staging, e))?;

        archive::set_executable_permissions(&binary_path)?;

        info!(
            app = %req.app_name,
            version = %release.version,
            path = %binary_path.display(),
            "installed"
        );
        Ok(InstallOutcome {
            installed_path: binary_path,
            installed_version: release.version,
        })
    }
}

/// Runs the blocking extraction on tokio's blocking pool.
async fn extract_binary<F>(
    format: ArchiveFormat,
    staging: PathBuf,
    bin_dir: PathBuf,
    filter: F,
) -> Result<usize>
where
    F: FnMut(&Path) -> Option<PathBuf> + Send + 'static,
{
    let archive_path = staging.clone();
    tokio::task::spawn_blocking(move || archive::extract(format, &staging, &bin_dir, filter))
        .await
        .map_err(|source| ReleaseError::ExtractTask {
            archive: archive_path,
            source,
        })?
}

/// Accepts entries named `app` or `app.exe` in any directory, renaming them
/// to `binary_name` at the root.
fn binary_filter(
    app: &str,
    binary_name: &str,
) -> impl FnMut(&Path) -> Option<PathBuf> + Send + 'static {
    let app = app.to_string();
    let exe = format!("{app}.exe");
    let binary_name = PathBuf::from(binary_name);
    move |entry: &Path| {
        let base = entry.file_name()?.to_str()?;
        (base == app || base == exe).then(|| binary_name.clone())
    }
}

/// Best-effort removal of a previously installed binary.
async fn remove_previous(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed previous binary"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove previous binary"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_latest_for_host() {
        let req = InstallRequest::new("ziti-edge-tunnel", "/opt/bin");
        assert_eq!(req.feed_name, "ziti-tunnel-sdk-c");
        assert_eq!(req.version, "latest");
        assert_eq!(req.target(), Target::host());
    }

    #[test]
    fn builders_override_fields() {
        let req = InstallRequest::new("tool", "/opt/bin")
            .with_version("v1.2.3")
            .with_target(Target::new("windows", "arm64"))
            .with_feed("tool-releases");
        assert_eq!(req.version, "v1.2.3");
        assert_eq!(req.target_os, "windows");
        assert_eq!(req.target_arch, "arm64");
        assert_eq!(req.feed_name, "tool-releases");
    }

    #[test]
    fn binary_name_gets_exe_on_windows() {
        let req = InstallRequest::new("ziti", "/opt/bin");
        let windows = req.clone().with_target(Target::new("windows", "amd64"));
        let linux = req.with_target(Target::new("linux", "amd64"));
        assert_eq!(windows.binary_name(), "ziti.exe");
        assert_eq!(linux.binary_name(), "ziti");
        assert_eq!(linux.binary_path(), PathBuf::from("/opt/bin/ziti"));
    }

    #[test]
    fn validate_accepts_plain_names() {
        for app in ["ziti", "ziti-edge-tunnel", "x", "tool.v2"] {
            assert!(InstallRequest::new(app, "/opt/bin").validate().is_ok(), "{app}");
        }
    }

    #[test]
    fn validate_rejects_names_leaving_bin_dir() {
        for app in ["", ".", "..", "../victim", "bin/ziti", "/etc/passwd", "..\\victim", "a\\b"] {
            let err = InstallRequest::new(app, "/opt/bin").validate().unwrap_err();
            assert!(
                matches!(err, ReleaseError::InvalidAppName { app: ref name } if name == app),
                "{app}: {err}"
            );
        }
    }

    #[test]
    fn filter_matches_base_name_only() {
        let mut filter = binary_filter("ziti", "ziti");
        assert_eq!(filter(Path::new("ziti")), Some(PathBuf::from("ziti")));
        assert_eq!(filter(Path::new("linux/amd64/ziti")), Some(PathBuf::from("ziti")));
        assert_eq!(filter(Path::new("bin/ziti.exe")), Some(PathBuf::from("ziti")));
        assert_eq!(filter(Path::new("bin/ziti.txt")), None);
        assert_eq!(filter(Path::new("ziti-router")), None);
        assert_eq!(filter(Path::new("bin/")), None);
    }

    #[tokio::test]
    async fn invalid_version_fails_before_any_request() {
        // Nothing listens on the discard port, so reaching the network would
        // surface a transport error instead of a parse error.
        let installer = Installer::with_policies(
            "http://127.0.0.1:9",
            HttpPolicy {
                retries: 0,
                ..HttpPolicy::feed()
            },
            HttpPolicy::download(),
        )
        .unwrap();
        let temp = tempfile::TempDir::new().unwrap();
        let req = InstallRequest::new("x", temp.path()).with_version("1.2");

        let err = installer.install(&req, false).await.unwrap_err();

        assert!(matches!(err, ReleaseError::Parse { ref tag, .. } if tag == "1.2"));
        assert!(std::fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn removing_a_missing_previous_binary_is_fine() {
        let temp = tempfile::TempDir::new().unwrap();
        remove_previous(&temp.path().join("absent")).await;
    }
}
