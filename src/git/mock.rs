use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::error::{BumpError, Result};
use crate::git::GitBackend;

/// Mock repository for testing without actual git operations.
///
/// Every call is appended to a log as a git-like command line, and any command
/// can be made to fail.
pub struct MockRepository {
    branch: RefCell<String>,
    tags: RefCell<BTreeSet<String>>,
    calls: RefCell<Vec<String>>,
    fail_on: RefCell<Vec<String>>,
    remote_url: Option<String>,
    commits: RefCell<u32>,
}

impl MockRepository {
    /// Create a new mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            branch: RefCell::new("main".to_string()),
            tags: RefCell::new(BTreeSet::new()),
            calls: RefCell::new(Vec::new()),
            fail_on: RefCell::new(Vec::new()),
            remote_url: None,
            commits: RefCell::new(0),
        }
    }

    /// Add an existing tag
    pub fn with_tag(self, name: impl Into<String>) -> Self {
        self.tags.borrow_mut().insert(name.into());
        self
    }

    /// Set the URL returned for every remote
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Make every command starting with `command` (e.g. `"push"`) fail
    pub fn fail_on(self, command: impl Into<String>) -> Self {
        self.fail_on.borrow_mut().push(command.into());
        self
    }

    /// Commands issued so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().iter().cloned().collect()
    }

    fn record(&self, command: String) -> Result<()> {
        let failing = self
            .fail_on
            .borrow()
            .iter()
            .any(|prefix| command.starts_with(prefix.as_str()));
        self.calls.borrow_mut().push(command.clone());
        if failing {
            return Err(BumpError::git_command(format!("mock failure: {}", command)));
        }
        Ok(())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GitBackend for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.borrow().clone())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("checkout -b {}", name))?;
        *self.branch.borrow_mut() = name.to_string();
        Ok(())
    }

    fn add_all(&self) -> Result<()> {
        self.record("add -A".to_string())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let subject = message.lines().next().unwrap_or_default();
        self.record(format!("commit -m {}", subject))?;
        let mut count = self.commits.borrow_mut();
        *count += 1;
        Ok(format!("{:07x}", *count))
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.borrow().contains(name))
    }

    fn create_tag(&self, name: &str, _message: &str) -> Result<()> {
        if self.tag_exists(name)? {
            return Err(BumpError::TagExists(name.to_string()));
        }
        self.record(format!("tag {}", name))?;
        self.tags.borrow_mut().insert(name.to_string());
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.record(format!("tag -d {}", name))?;
        self.tags.borrow_mut().remove(name);
        Ok(())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        self.record(format!("push {} {}", remote, refspecs.join(" ")))
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self.tags.borrow().iter().next_back().cloned())
    }

    fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        Ok(self.remote_url.clone())
    }
}
