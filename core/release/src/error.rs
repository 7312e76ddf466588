//! Error types for the release pipeline.
//!
//! Every stage of the pipeline returns a [`ReleaseError`] instead of logging
//! and continuing. Variants carry the identifiers needed to act on a failure
//! (application, tag, URL, path) so the CLI layer can print them as-is.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = ReleaseError> = std::result::Result<T, E>;

/// Consolidated error type for release resolution, download and installation.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A tag or requested version is not a semantic version.
    #[error("unable to parse version '{tag}'")]
    Parse {
        /// The string that failed to parse.
        tag: String,
        /// The underlying semver error.
        #[source]
        source: semver::Error,
    },

    /// The application name is not usable as a file name inside the
    /// binary directory.
    #[error("invalid application name '{app}': must be a single file name")]
    InvalidAppName {
        /// The rejected name.
        app: String,
    },

    /// The release feed returned an empty collection.
    #[error("no releases found for '{feed}'")]
    NoReleases {
        /// The feed that was queried.
        feed: String,
    },

    /// The server answered 404; usually a wrong application name or URL.
    #[error("not found (invalid URL or app name): {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP status {status} returned for {url}")]
    HttpStatus {
        /// The requested URL.
        url: String,
        /// The numeric status code.
        status: u16,
    },

    /// The request never produced a response (connect failure, timeout,
    /// redirect limit exceeded) or the body stream broke.
    #[error("request to {url} failed")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client {
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The release feed body did not have the expected JSON shape.
    #[error("unexpected response body from {url}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// No asset of the release matches the target platform.
    #[error("no download URL found for os/arch {os}/{arch} for '{app}'")]
    NoMatchingAsset {
        /// The application being installed.
        app: String,
        /// Target operating system token.
        os: String,
        /// Target architecture token.
        arch: String,
    },

    /// The selected asset is neither a ZIP nor a gzipped tarball.
    #[error("unsupported release file type '{url}'")]
    UnsupportedArchive {
        /// The selected download URL.
        url: String,
    },

    /// An archive entry would be written outside the destination root.
    #[error("illegal file path in archive: '{entry}' escapes {}", root.display())]
    PathTraversal {
        /// The entry name as stored in the archive (or as renamed).
        entry: String,
        /// The destination root.
        root: PathBuf,
    },

    /// The archive is not a readable ZIP container.
    #[error("failed to read ZIP archive {}", path.display())]
    Zip {
        /// Path of the archive.
        path: PathBuf,
        /// The underlying ZIP error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive did not contain exactly one copy of the expected executable.
    #[error(
        "expected exactly one '{binary}' executable in release archive {}, found {count}",
        archive.display()
    )]
    BinaryNotFound {
        /// The executable name that was looked for.
        binary: String,
        /// Path of the staging archive.
        archive: PathBuf,
        /// How many entries matched.
        count: usize,
    },

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction of {} did not complete", archive.display())]
    ExtractTask {
        /// Path of the staging archive.
        archive: PathBuf,
        /// The underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },

    /// A filesystem operation failed.
    #[error("failed to {op} {}", path.display())]
    Io {
        /// The operation, phrased as a verb ("create", "write", ...).
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    /// Creates a new `Io` error for `op` applied to `path`.
    #[must_use]
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors that mean the application or URL does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_releases_names_feed() {
        let err = ReleaseError::NoReleases {
            feed: "ziti".to_string(),
        };
        assert_eq!(err.to_string(), "no releases found for 'ziti'");
    }

    #[test]
    fn http_status_carries_code_and_url() {
        let err = ReleaseError::HttpStatus {
            url: "https://example.com/a.zip".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "HTTP status 503 returned for https://example.com/a.zip"
        );
    }

    #[test]
    fn no_matching_asset_displays_platform() {
        let err = ReleaseError::NoMatchingAsset {
            app: "ziti".to_string(),
            os: "linux".to_string(),
            arch: "mips".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no download URL found for os/arch linux/mips for 'ziti'"
        );
    }

    #[test]
    fn io_error_displays_operation_and_path() {
        let err = ReleaseError::io(
            "create",
            "/tmp/bin/ziti",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.to_string(), "failed to create /tmp/bin/ziti");
    }

    #[test]
    fn path_traversal_displays_entry_and_root() {
        let err = ReleaseError::PathTraversal {
            entry: "../outside.txt".to_string(),
            root: PathBuf::from("/tmp/install"),
        };
        assert_eq!(
            err.to_string(),
            "illegal file path in archive: '../outside.txt' escapes /tmp/install"
        );
    }

    #[test]
    fn invalid_app_name_displays_name() {
        let err = ReleaseError::InvalidAppName {
            app: "../victim".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid application name '../victim': must be a single file name"
        );
    }

    #[test]
    fn only_not_found_reports_not_found() {
        let not_found = ReleaseError::NotFound {
            url: "u".to_string(),
        };
        let status = ReleaseError::HttpStatus {
            url: "u".to_string(),
            status: 500,
        };
        assert!(not_found.is_not_found());
        assert!(!status.is_not_found());
    }
}
