use std::path::Path;

use git2::{
    Commit, DescribeFormatOptions, DescribeOptions, ErrorCode, IndexAddOption, ObjectType,
    PushOptions, RemoteCallbacks, Repository as Git2Repo,
};
use tracing::debug;

use crate::error::{BumpError, Result};
use crate::git::GitBackend;

/// Wrapper around git2::Repository implementing [GitBackend]
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl GitBackend for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let commit = self
            .head_commit()?
            .ok_or_else(|| BumpError::git_command("cannot branch from a repository without commits"))?;

        self.repo.branch(name, &commit, false).map_err(|e| {
            if e.code() == ErrorCode::Exists {
                BumpError::git_command(format!("branch '{}' already exists", name))
            } else {
                BumpError::Git(e)
            }
        })?;

        // Same tree as HEAD, so moving HEAD keeps the working tree and index intact.
        self.repo.set_head(&format!("refs/heads/{}", name))?;
        debug!(branch = name, "created and checked out branch");
        Ok(())
    }

    fn add_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;

        let parent = self.head_commit()?;
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        let short: String = oid.to_string().chars().take(7).collect();
        debug!(commit = %short, "created commit");
        Ok(short)
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        let tags = self.repo.tag_names(Some(name))?;
        let exists = tags.iter().flatten().any(|tag| tag == name);
        Ok(exists)
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        if self.tag_exists(name)? {
            return Err(BumpError::TagExists(name.to_string()));
        }

        let target = self.repo.head()?.peel(ObjectType::Commit)?;
        let signature = self.repo.signature()?;
        self.repo
            .tag(name, &target, &signature, message, false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    BumpError::TagExists(name.to_string())
                } else {
                    BumpError::Git(e)
                }
            })?;
        debug!(tag = name, "created tag");
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo.tag_delete(name)?;
        debug!(tag = name, "deleted tag");
        Ok(())
    }

    fn push(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            BumpError::git_command(format!("Remote '{}' not found: {}", remote_name, e))
        })?;
        let git_config = self.repo.config()?;

        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0;
        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > 3 {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }
            }

            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let Ok(cred) = git2::Cred::credential_helper(&git_config, url, username_from_url)
                {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "{} was rejected: {}",
                refname, reason
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let specs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
        remote
            .push(&specs, Some(&mut push_options))
            .map_err(|e| {
                BumpError::git_command(format!("Push to '{}' failed: {}", remote_name, e))
            })?;
        debug!(remote = remote_name, ?refspecs, "pushed");
        Ok(())
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        let mut options = DescribeOptions::new();
        options.describe_tags();
        let description = match self.repo.describe(&options) {
            Ok(description) => description,
            Err(e) => {
                debug!(error = %e, "no tag describes HEAD");
                return Ok(None);
            }
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        Ok(Some(description.format(Some(&format))?))
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        match self.repo.find_remote(remote) {
            Ok(found) => Ok(found.url().map(str::to_string)),
            Err(e) => {
                debug!(remote, error = %e, "remote not configured");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Git2Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        let backend = Git2Repository::from_git2(repo);
        backend.add_all().unwrap();
        backend.commit("Initial commit").unwrap();
        (dir, backend)
    }

    #[test]
    fn test_commit_and_branch() {
        let (dir, backend) = init_repo();

        backend.create_branch("release/v1.0.1").unwrap();
        assert_eq!(backend.current_branch().unwrap(), "release/v1.0.1");

        fs::write(dir.path().join("README.md"), "changed\n").unwrap();
        backend.add_all().unwrap();
        let hash = backend.commit("chore: bump").unwrap();
        assert_eq!(hash.len(), 7);

        let repo = Git2Repo::open(dir.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("chore: bump"));
        assert!(repo.statuses(None).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_branch_fails() {
        let (_dir, backend) = init_repo();
        backend.create_branch("feature").unwrap();
        assert!(backend.create_branch("feature").is_err());
    }

    #[test]
    fn test_tag_lifecycle() {
        let (_dir, backend) = init_repo();

        assert_eq!(backend.latest_tag().unwrap(), None);
        backend.create_tag("v1.0.0", "Release v1.0.0").unwrap();
        assert!(backend.tag_exists("v1.0.0").unwrap());
        assert_eq!(backend.latest_tag().unwrap().as_deref(), Some("v1.0.0"));

        let err = backend.create_tag("v1.0.0", "again").unwrap_err();
        assert!(matches!(err, BumpError::TagExists(_)));

        backend.delete_tag("v1.0.0").unwrap();
        assert!(!backend.tag_exists("v1.0.0").unwrap());
    }

    #[test]
    fn test_push_to_local_remote() {
        let (_dir, backend) = init_repo();
        let remote_dir = TempDir::new().unwrap();
        let bare = Git2Repo::init_bare(remote_dir.path()).unwrap();
        backend
            .repo
            .remote("origin", remote_dir.path().to_str().unwrap())
            .unwrap();

        let branch = backend.current_branch().unwrap();
        backend.create_tag("v0.1.0", "Release").unwrap();
        backend
            .push(
                "origin",
                &[
                    format!("refs/heads/{0}:refs/heads/{0}", branch),
                    "refs/tags/v0.1.0:refs/tags/v0.1.0".to_string(),
                ],
            )
            .unwrap();

        assert!(bare.find_reference("refs/tags/v0.1.0").is_ok());
        assert!(bare.find_reference(&format!("refs/heads/{}", branch)).is_ok());
        assert!(backend.remote_url("origin").unwrap().is_some());
        assert_eq!(backend.remote_url("upstream").unwrap(), None);
    }

    #[test]
    fn test_push_to_missing_remote_fails() {
        let (_dir, backend) = init_repo();
        let err = backend.push("origin", &[]).unwrap_err();
        assert!(err.to_string().contains("Remote 'origin' not found"));
    }
}
