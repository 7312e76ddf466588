//! Release feed client and version resolution.
//!
//! The feed is a GitHub-style releases API:
//!
//! ```text
//! GET {base}/{feed}/releases              -> [ { "tag_name": ..., "assets": [...] }, ... ]
//! GET {base}/{feed}/releases/tags/{tag}   -> { "tag_name": ..., "assets": [...] }
//! ```
//!
//! Only `tag_name` and `assets[].browser_download_url` are read; any other
//! shape is rejected. Every tag is parsed with
//! [`parse_tolerant`](crate::version::parse_tolerant) when the descriptor is
//! built, so a malformed tag fails the whole query instead of being skipped.

use semver::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ReleaseError, Result};
use crate::http::{HttpPolicy, get_with_retry};
use crate::version::{compare, parse_tolerant};

/// Releases API of the openziti organisation.
pub const DEFAULT_FEED_URL: &str = "https://api.github.com/repos/openziti";

/// Media type requested from the releases API.
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Page size requested when listing releases.
const RELEASES_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    browser_download_url: String,
}

/// One downloadable artifact of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Direct download URL of the artifact.
    pub download_url: String,
}

/// A release with its tag already parsed into a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    /// The tag exactly as published.
    pub tag: String,
    /// The tag parsed as a semantic version.
    pub version: Version,
    /// Artifacts in feed order.
    pub assets: Vec<AssetRef>,
}

impl ReleaseDescriptor {
    /// Builds a descriptor, parsing `tag` tolerantly.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Parse`] if the tag is not a version.
    pub fn new<I, S>(tag: impl Into<String>, download_urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tag = tag.into();
        let version = parse_tolerant(&tag)?;
        let assets = download_urls
            .into_iter()
            .map(|url| AssetRef {
                download_url: url.into(),
            })
            .collect();
        Ok(Self {
            tag,
            version,
            assets,
        })
    }

    fn from_github(release: GitHubRelease) -> Result<Self> {
        Self::new(
            release.tag_name,
            release
                .assets
                .into_iter()
                .map(|asset| asset.browser_download_url),
        )
    }
}

/// Returns the release with the highest version.
///
/// Ties keep feed order.
///
/// # Errors
///
/// Returns [`ReleaseError::NoReleases`] if `releases` is empty.
pub fn highest_release(
    feed: &str,
    mut releases: Vec<ReleaseDescriptor>,
) -> Result<ReleaseDescriptor> {
    releases.sort_by(|a, b| compare(&b.version, &a.version));
    releases
        .into_iter()
        .next()
        .ok_or_else(|| ReleaseError::NoReleases {
            feed: feed.to_string(),
        })
}

/// Client for one release feed.
#[derive(Debug, Clone)]
pub struct ReleaseFeed {
    base_url: String,
    client: reqwest::Client,
    policy: HttpPolicy,
}

impl ReleaseFeed {
    /// Creates a client for the feed rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, policy: HttpPolicy) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            client: policy.build_client()?,
            policy,
        })
    }

    /// Creates a client for [`DEFAULT_FEED_URL`] with the feed policy.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Client`] if the HTTP client cannot be built.
    pub fn openziti() -> Result<Self> {
        Self::new(DEFAULT_FEED_URL, HttpPolicy::feed())
    }

    /// The base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL listing all releases of `feed`.
    #[must_use]
    pub fn releases_url(&self, feed: &str) -> String {
        format!(
            "{}/{feed}/releases?per_page={RELEASES_PER_PAGE}",
            self.base_url
        )
    }

    /// URL of the release of `feed` tagged `tag`.
    #[must_use]
    pub fn release_url(&self, feed: &str, tag: &str) -> String {
        format!("{}/{feed}/releases/tags/{tag}", self.base_url)
    }

    /// Returns the release of `feed` with the highest semantic version.
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::Parse`] if any release tag is not a version
    /// - [`ReleaseError::NoReleases`] if the feed has no releases
    /// - HTTP and decode errors from the query
    pub async fn resolve_latest(&self, feed: &str) -> Result<ReleaseDescriptor> {
        let url = self.releases_url(feed);
        let releases: Vec<GitHubRelease> = self.get_json(&url).await?;
        debug!(feed, count = releases.len(), "fetched release list");

        let releases = releases
            .into_iter()
            .map(ReleaseDescriptor::from_github)
            .collect::<Result<Vec<_>>>()?;

        let latest = highest_release(feed, releases)?;
        info!(feed, version = %latest.version, "resolved latest release");
        Ok(latest)
    }

    /// Returns the release of `feed` published under exactly `tag`.
    ///
    /// The tag is used as given; per-application spelling is applied by the
    /// caller through [`TagRule`](crate::apps::TagRule).
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::NotFound`] if no release carries the tag
    /// - [`ReleaseError::Parse`] if the returned tag is not a version
    /// - HTTP and decode errors from the query
    pub async fn resolve_exact(&self, feed: &str, tag: &str) -> Result<ReleaseDescriptor> {
        let url = self.release_url(feed, tag);
        let release: GitHubRelease = self.get_json(&url).await?;
        let release = ReleaseDescriptor::from_github(release)?;
        info!(feed, tag, version = %release.version, "resolved release");
        Ok(release)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = get_with_retry(&self.client, &self.policy, url, Some(GITHUB_ACCEPT)).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| ReleaseError::Transport {
                url: url.to_string(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| ReleaseError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
