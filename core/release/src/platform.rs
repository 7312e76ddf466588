//! Host platform detection.
//!
//! Release assets name platforms the way Go toolchains do (`linux`, `darwin`,
//! `windows`; `amd64`, `arm64`, `arm`), so the host's Rust target names are
//! translated into those tokens.

use std::fmt;

/// Operating system and architecture tokens used to pick release assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Operating system token, e.g. `linux`.
    pub os: String,
    /// Architecture token, e.g. `amd64`.
    pub arch: String,
}

impl Target {
    /// Creates a target from explicit tokens.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for.
    #[must_use]
    pub fn host() -> Self {
        Self::new(
            os_token(std::env::consts::OS),
            arch_token(std::env::consts::ARCH),
        )
    }

    /// Returns whether this target is Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os.eq_ignore_ascii_case("windows")
    }

    /// Returns the executable suffix for this target: `.exe` on Windows,
    /// empty elsewhere.
    #[must_use]
    pub fn executable_extension(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Translates a Rust OS name into a release OS token.
#[must_use]
pub fn os_token(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Translates a Rust architecture name into a release architecture token.
#[must_use]
pub fn arch_token(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}
