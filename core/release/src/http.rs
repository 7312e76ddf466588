//! HTTP policy and the retrying request exchange.
//!
//! Timeout, retry count and redirect cap live in one [`HttpPolicy`] value
//! that is handed to client construction. Both the release feed and the
//! downloader go through [`get_with_retry`], so the retry logic exists once.
//!
//! Retries cover the request/response exchange only: transient transport
//! failures and `429`/`5xx` statuses are retried with exponential backoff and
//! jitter; `404` and other client errors are not.

use std::time::Duration;

use rand::Rng;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::error::{ReleaseError, Result};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("zitiup/", env!("CARGO_PKG_VERSION"));

/// Timeout, retry and redirect settings for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpPolicy {
    /// Per-attempt timeout, covering the whole exchange including the body.
    pub timeout: Duration,
    /// Retries after the first attempt; total attempts are `retries + 1`.
    pub retries: u32,
    /// Redirect hops followed before the request fails.
    pub max_redirects: usize,
    /// Backoff before the first retry; doubled for every further retry.
    pub retry_wait: Duration,
    /// Upper bound for the backoff.
    pub max_retry_wait: Duration,
}

impl HttpPolicy {
    /// Policy for release-feed queries: 2s timeout, 5 retries, 15 redirects.
    #[must_use]
    pub const fn feed() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            retries: 5,
            max_redirects: 15,
            retry_wait: Duration::from_millis(100),
            max_retry_wait: Duration::from_secs(2),
        }
    }

    /// Policy for asset downloads: one minute per attempt, 5 retries, 15 redirects.
    #[must_use]
    pub const fn download() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            ..Self::feed()
        }
    }

    /// Builds an HTTP client honouring this policy's timeout and redirect cap.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Client`] if the TLS backend cannot be initialised.
    pub fn build_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()
            .map_err(|source| ReleaseError::Client { source })
    }

    /// Backoff before retry number `attempt` (1-based), with +/- 25% jitter.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let base = self.retry_wait.saturating_mul(factor).min(self.max_retry_wait);
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let jitter_range = base_ms / 4;
        let jitter = rand::rng().random_range(0..=jitter_range * 2);
        Duration::from_millis(base_ms - jitter_range + jitter)
    }
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self::feed()
    }
}

/// Sends `GET url`, retrying transient failures according to `policy`.
///
/// A `404` becomes [`ReleaseError::NotFound`]; any other non-success status
/// left after retries becomes [`ReleaseError::HttpStatus`].
pub(crate) async fn get_with_retry(
    client: &Client,
    policy: &HttpPolicy,
    url: &str,
    accept: Option<&str>,
) -> Result<Response> {
    let mut attempt = 0;
    loop {
        let mut request = client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let outcome = request.send().await;
        let retryable = match &outcome {
            Ok(response) => is_retryable_status(response.status()),
            Err(err) => is_transient(err),
        };

        if !retryable || attempt >= policy.retries {
            return check_status(url, outcome);
        }

        attempt += 1;
        let delay = policy.retry_delay(attempt);
        match &outcome {
            Ok(response) => {
                debug!(url, status = %response.status(), attempt, ?delay, "retrying request");
            }
            Err(err) => debug!(url, error = %err, attempt, ?delay, "retrying request"),
        }
        drop(outcome);
        tokio::time::sleep(delay).await;
    }
}

fn check_status(url: &str, outcome: reqwest::Result<Response>) -> Result<Response> {
    let response = outcome.map_err(|source| ReleaseError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ReleaseError::NotFound {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(ReleaseError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(err: &reqwest::Error) -> bool {
    !err.is_redirect()
        && !err.is_builder()
        && (err.is_timeout() || err.is_connect() || err.is_request())
}
