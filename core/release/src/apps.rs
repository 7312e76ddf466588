//! Known applications and their release-tag conventions.
//!
//! The projects publishing releases disagree about whether tags carry a `v`
//! prefix. Instead of special-casing names at call sites, each application
//! has a row in [`KNOWN_APPS`] naming its feed and its [`TagRule`]. New
//! applications are added here and nowhere else.

/// How a user-supplied version is spelled when looking a release up by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    /// Use the version exactly as given.
    Verbatim,
    /// Drop a leading `v`.
    StripV,
    /// Add a leading `v` when missing.
    EnsureV,
}

impl TagRule {
    /// Rewrites `version` according to this rule.
    #[must_use]
    pub fn apply(self, version: &str) -> String {
        match self {
            Self::Verbatim => version.to_string(),
            Self::StripV => version.strip_prefix('v').unwrap_or(version).to_string(),
            Self::EnsureV if version.starts_with('v') => version.to_string(),
            Self::EnsureV => format!("v{version}"),
        }
    }

    /// Looks up the rule for an application; unknown applications are verbatim.
    #[must_use]
    pub fn for_app(app: &str) -> Self {
        KnownApp::lookup(app).map_or(Self::Verbatim, |known| known.tag_rule)
    }
}

/// A row of the application table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownApp {
    /// Logical name, which is also the installed executable name.
    pub name: &'static str,
    /// Name of the release feed publishing the application.
    pub feed: &'static str,
    /// Tag spelling used by that feed.
    pub tag_rule: TagRule,
}

/// Applications with a feed name or tag convention of their own.
pub const KNOWN_APPS: &[KnownApp] = &[
    KnownApp {
        name: "ziti",
        feed: "ziti",
        tag_rule: TagRule::EnsureV,
    },
    KnownApp {
        name: "ziti-edge-tunnel",
        feed: "ziti-tunnel-sdk-c",
        tag_rule: TagRule::EnsureV,
    },
    KnownApp {
        name: "ziti-prox-c",
        feed: "ziti-sdk-c",
        tag_rule: TagRule::StripV,
    },
];

impl KnownApp {
    /// Finds the table row for `name`.
    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static KnownApp> {
        KNOWN_APPS.iter().find(|app| app.name == name)
    }
}

/// Returns the feed publishing `app`; unknown applications publish under their own name.
#[must_use]
pub fn feed_for(app: &str) -> &str {
    KnownApp::lookup(app).map_or(app, |known| known.feed)
}
