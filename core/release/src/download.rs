//! Asset download.
//!
//! The response body is streamed straight to the destination path so large
//! archives are never held in memory. A failed transfer removes the partial
//! file before returning the error.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ReleaseError, Result};
use crate::http::{HttpPolicy, get_with_retry};

/// Downloads release assets to disk.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    policy: HttpPolicy,
}

impl Downloader {
    /// Creates a downloader using the given policy.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Client`] if the HTTP client cannot be built.
    pub fn new(policy: HttpPolicy) -> Result<Self> {
        Ok(Self {
            client: policy.build_client()?,
            policy,
        })
    }

    /// Downloads `url` to `dest`, replacing any existing file.
    ///
    /// Returns once the body has been fully written and synced to storage.
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::NotFound`] for a `404`
    /// - [`ReleaseError::HttpStatus`] for any other non-success status
    /// - [`ReleaseError::Transport`] if the request or body stream fails
    /// - [`ReleaseError::Io`] if the destination cannot be written
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!(url, dest = %dest.display(), "downloading");
        let response = get_with_retry(&self.client, &self.policy, url, None).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ReleaseError::io("create directory", parent, e))?;
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| ReleaseError::io("create", dest, e))?;

        match write_body(response, &mut file, url, dest).await {
            Ok(written) => {
                info!(url, bytes = written, "downloaded {}", dest.display());
                Ok(written)
            }
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }
}

async fn write_body(
    response: reqwest::Response,
    file: &mut tokio::fs::File,
    url: &str,
    dest: &Path,
) -> Result<u64> {
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| ReleaseError::Transport {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ReleaseError::io("write", dest, e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| ReleaseError::io("flush", dest, e))?;
    file.sync_all()
        .await
        .map_err(|e| ReleaseError::io("sync", dest, e))?;

    Ok(written)
}
