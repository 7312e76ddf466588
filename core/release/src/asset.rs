//! Platform asset selection.
//!
//! Assets are matched by substring on the lower-cased download URL: the URL
//! must contain the OS token and at least one accepted architecture token.
//! `amd64` also accepts `x86_64`. The first matching asset wins, so a URL that
//! happens to contain several OS names matches each of them.

use crate::error::{ReleaseError, Result};
use crate::feed::ReleaseDescriptor;

/// Returns the architecture tokens accepted for `target_arch`.
#[must_use]
pub fn accepted_arches(target_arch: &str) -> Vec<&str> {
    let mut arches = vec![target_arch];
    if target_arch.eq_ignore_ascii_case("amd64") {
        arches.push("x86_64");
    }
    arches
}

/// Picks the download URL of `release` built for `target_os`/`target_arch`.
///
/// # Errors
///
/// Returns [`ReleaseError::NoMatchingAsset`] if no asset matches.
pub fn select_asset<'a>(
    release: &'a ReleaseDescriptor,
    app: &str,
    target_os: &str,
    target_arch: &str,
) -> Result<&'a str> {
    let arches = accepted_arches(target_arch);

    release
        .assets
        .iter()
        .map(|asset| asset.download_url.as_str())
        .find(|url| {
            let lowered = url.to_lowercase();
            arches.iter().any(|arch| lowered.contains(arch)) && lowered.contains(target_os)
        })
        .ok_or_else(|| ReleaseError::NoMatchingAsset {
            app: app.to_string(),
            os: target_os.to_string(),
            arch: target_arch.to_string(),
        })
}
