//! Tolerant semantic version parsing and precedence ordering.
//!
//! Release tags are inconsistent about the `v` prefix (`v1.2.3` vs `1.2.3`),
//! so every tag goes through [`parse_tolerant`] before it is compared.

use std::cmp::Ordering;

use semver::Version;

use crate::error::{ReleaseError, Result};

/// Keyword accepted in place of a version to request the newest release.
pub const LATEST: &str = "latest";

/// Parses a version string, accepting an optional leading `v`.
///
/// Surrounding whitespace is ignored. The remainder must be a complete
/// `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]` version.
///
/// # Errors
///
/// Returns [`ReleaseError::Parse`] if the remainder is not a valid version.
pub fn parse_tolerant(tag: &str) -> Result<Version> {
    let trimmed = tag.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|source| ReleaseError::Parse {
        tag: tag.to_string(),
        source,
    })
}

/// Compares two versions by semantic-version precedence.
///
/// Build metadata does not take part in the ordering.
#[must_use]
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp_precedence(b)
}

/// The version a caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    /// The highest released version.
    Latest,
    /// A specific version, kept as typed so per-application tag rules can
    /// decide how to spell it.
    Exact(String),
}

impl RequestedVersion {
    /// Interprets a user-supplied version string.
    ///
    /// An empty string or `latest` selects [`RequestedVersion::Latest`].
    /// Anything else must parse as a version (after stripping an optional `v`).
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Parse`] for a string that is not a version.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == LATEST {
            return Ok(Self::Latest);
        }
        parse_tolerant(raw)?;
        Ok(Self::Exact(raw.to_string()))
    }
}
