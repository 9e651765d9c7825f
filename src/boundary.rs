use std::fmt;

use crate::platform::Platform;

/// Non-fatal conditions met while collecting versions or planning a release.
/// They are reported to the user but never stop the command on their own.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// A manifest exists but could not be read; the platform is left out
    ManifestUnreadable { platform: Platform, reason: String },
    /// No enabled platform has a manifest under the project root
    NoManifestsFound { root: String },
    /// A rendered branch or tag name was unusable and a default was used instead
    NameFallback {
        kind: String,
        template: String,
        name: String,
    },
    /// Git integration was requested but no repository could be opened
    RepositoryUnavailable { reason: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::ManifestUnreadable { platform, reason } => {
                write!(f, "Cannot read the {} manifest: {}", platform, reason)
            }
            BoundaryWarning::NoManifestsFound { root } => {
                write!(f, "No version manifests found under '{}'", root)
            }
            BoundaryWarning::NameFallback {
                kind,
                template,
                name,
            } => write!(
                f,
                "{} template '{}' did not produce a usable name, using '{}'",
                kind, template, name
            ),
            BoundaryWarning::RepositoryUnavailable { reason } => {
                write!(f, "Git steps unavailable: {}", reason)
            }
        }
    }
}
