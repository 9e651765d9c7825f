//! Git operations abstraction layer
//!
//! The release workflow only talks to the [GitBackend] trait. Implementations:
//!
//! - [repository::Git2Repository]: a real repository, driven through `git2`
//! - [mock::MockRepository]: an in-memory recorder for tests
//!
//! [follow_up_links] turns a pushed release into "create release" and
//! "create pull request" URLs for GitHub remotes.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Git operations needed by the release workflow.
///
/// Each method corresponds to one git command (`checkout -b`, `add -A`,
/// `commit`, `tag`, `tag -l`, `tag -d`, `push`, `describe --tags`,
/// `config --get remote.<name>.url`). Errors carry the underlying message.
pub trait GitBackend {
    /// Name of the checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// Creates a branch at HEAD and checks it out, keeping working tree changes.
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Stages every change in the working tree, deletions included.
    fn add_all(&self) -> Result<()>;

    /// Commits the index and returns the short hash of the new commit.
    fn commit(&self, message: &str) -> Result<String>;

    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Creates an annotated tag at HEAD.
    ///
    /// # Returns
    /// * `Err(BumpError::TagExists)` - If a tag with that name already exists
    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Pushes refspecs such as `refs/heads/main:refs/heads/main` to a remote.
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;

    /// The most recent tag reachable from HEAD, if any.
    fn latest_tag(&self) -> Result<Option<String>>;

    /// The configured URL of a remote, if the remote exists.
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;
}

/// Browser links offered after a release was pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpLinks {
    pub create_release: Option<String>,
    pub create_pull_request: Option<String>,
}

/// Converts a GitHub remote URL (https or ssh) into `https://github.com/owner/repo`.
pub fn web_url(remote_url: &str) -> Option<String> {
    let url = remote_url.trim();
    let path = if let Some(rest) = url.strip_prefix("git@github.com:") {
        rest
    } else if let Some(rest) = url.strip_prefix("ssh://git@github.com/") {
        rest
    } else if let Some(rest) = url.strip_prefix("https://github.com/") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://github.com/") {
        rest
    } else {
        return None;
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.split('/').filter(|s| !s.is_empty()).count() != 2 {
        return None;
    }
    Some(format!("https://github.com/{}", path))
}

/// Links for the follow-up actions of a pushed release.
///
/// A release link needs a pushed tag; a pull-request link needs a pushed branch.
pub fn follow_up_links(
    remote_url: &str,
    tag: Option<&str>,
    branch: Option<&str>,
) -> Option<FollowUpLinks> {
    let base = web_url(remote_url)?;
    Some(FollowUpLinks {
        create_release: tag.map(|t| format!("{}/releases/new?tag={}", base, t)),
        create_pull_request: branch.map(|b| format!("{}/compare/{}?expand=1", base, b)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_url_forms() {
        let expected = Some("https://github.com/acme/app".to_string());
        assert_eq!(web_url("git@github.com:acme/app.git"), expected);
        assert_eq!(web_url("https://github.com/acme/app.git"), expected);
        assert_eq!(web_url("https://github.com/acme/app/"), expected);
        assert_eq!(web_url("ssh://git@github.com/acme/app"), expected);
        assert_eq!(web_url("https://gitlab.com/acme/app.git"), None);
        assert_eq!(web_url("https://github.com/acme"), None);
    }

    #[test]
    fn test_follow_up_links() {
        let links = follow_up_links(
            "git@github.com:acme/app.git",
            Some("v1.0.1"),
            Some("release/v1.0.1"),
        )
        .unwrap();
        assert_eq!(
            links.create_release.as_deref(),
            Some("https://github.com/acme/app/releases/new?tag=v1.0.1")
        );
        assert_eq!(
            links.create_pull_request.as_deref(),
            Some("https://github.com/acme/app/compare/release/v1.0.1?expand=1")
        );

        let no_tag = follow_up_links("https://github.com/acme/app", None, None).unwrap();
        assert!(no_tag.create_release.is_none());
    }
}
