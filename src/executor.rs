//! Batch execution: apply the version operations of a plan, then run the
//! git leg.
//!
//! Version operations are independent of each other: every one runs and its
//! outcome is recorded, whatever happened to the others. A manifest that could
//! not be read at planning time gets its own failed result. The git leg is a
//! strict sequence; the first failing step stops it.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::BumpError;
use crate::git::GitBackend;
use crate::plan::{
    default_commit_message, BatchExecutionPlan, BatchOperation, GitPlan, OperationTarget,
};
use crate::platform::{Manifest, Platform};
use crate::template::{PlatformUpdate, TemplateContext};
use crate::ui::Interaction;

const GIT_LABEL: &str = "Git";

/// Outcome of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BumpResult {
    /// `Package`, `Android`, `iOS` or `Git`
    pub platform: String,
    pub success: bool,
    pub old_version: String,
    pub new_version: String,
    pub message: String,
    pub error: Option<String>,
    /// What was written, for successful version operations.
    pub update: Option<PlatformUpdate>,
}

/// What the git leg managed to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitWorkflowResult {
    pub branch_created: bool,
    pub branch_name: Option<String>,
    pub committed: bool,
    pub commit_message: Option<String>,
    pub tagged: bool,
    pub tag_name: Option<String>,
    pub pushed: bool,
    pub remote: Option<String>,
}

/// Every result of one execution, version operations first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub results: Vec<BumpResult>,
    pub git: Option<GitWorkflowResult>,
}

impl ExecutionReport {
    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.successful() == self.total()
    }

    /// Updates that were actually written, in plan order.
    pub fn updates(&self) -> Vec<PlatformUpdate> {
        self.results.iter().filter_map(|r| r.update.clone()).collect()
    }
}

/// Runs a plan.
///
/// Never fails as a whole; every failure ends up in its own [`BumpResult`].
///
/// # Arguments
/// * `root` - Project root the manifests are resolved against
/// * `config` - Path overrides for the manifests
/// * `plan` - The plan to run, as previewed to the user
/// * `git` - Repository for the git leg, `None` when none could be opened
/// * `session` - Asked before an existing tag is overwritten
pub fn execute(
    root: &Path,
    config: &Config,
    plan: &BatchExecutionPlan,
    git: Option<&dyn GitBackend>,
    session: &mut dyn Interaction,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for platform in Platform::ALL {
        if let Some(entry) = plan.failed.iter().find(|e| e.platform == platform) {
            warn!(%platform, error = %entry.reason, "manifest could not be read");
            report.results.push(BumpResult {
                platform: platform.label().to_string(),
                success: false,
                old_version: String::new(),
                new_version: String::new(),
                message: format!("Failed to read {}", platform),
                error: Some(entry.reason.clone()),
                update: None,
            });
        }

        if let Some(record) = plan.unchanged.iter().find(|r| r.platform() == platform) {
            let current = record.to_string();
            report.results.push(BumpResult {
                platform: platform.label().to_string(),
                success: true,
                old_version: current.clone(),
                new_version: current,
                message: "No change".to_string(),
                error: None,
                update: None,
            });
        }

        for operation in plan.version_operations() {
            let OperationTarget::Manifest {
                platform: target,
                version,
                build,
            } = &operation.target
            else {
                continue;
            };
            if *target == platform {
                report
                    .results
                    .push(apply_version(root, config, operation, platform, version, *build));
            }
        }
    }

    if let Some(git_plan) = &plan.git {
        let updates = report.updates();
        let (result, workflow) = match git {
            None => (
                git_failure("Git workflow skipped", "no git repository available"),
                GitWorkflowResult::default(),
            ),
            Some(_) if updates.is_empty() => (
                git_failure("Git workflow skipped", "no manifest was updated"),
                GitWorkflowResult::default(),
            ),
            Some(backend) => run_git_workflow(git_plan, updates, backend, session),
        };
        report.results.push(result);
        report.git = Some(workflow);
    }

    info!(
        successful = report.successful(),
        total = report.total(),
        "execution finished"
    );
    report
}

fn apply_version(
    root: &Path,
    config: &Config,
    operation: &BatchOperation,
    platform: Platform,
    version: &str,
    build: Option<u64>,
) -> BumpResult {
    let manifest = Manifest::for_platform(platform, config);
    match manifest.write(root, version, build) {
        Ok(()) => {
            debug!(%platform, new = %operation.new_value, "manifest updated");
            let message = if operation.old_value == operation.new_value {
                "No change".to_string()
            } else {
                format!("Updated to {}", operation.new_value)
            };
            BumpResult {
                platform: platform.label().to_string(),
                success: true,
                old_version: operation.old_value.clone(),
                new_version: operation.new_value.clone(),
                message,
                error: None,
                update: operation.update(),
            }
        }
        Err(e) => {
            warn!(%platform, error = %e, "manifest update failed");
            BumpResult {
                platform: platform.label().to_string(),
                success: false,
                old_version: operation.old_value.clone(),
                new_version: operation.new_value.clone(),
                message: format!("Failed to update {}", platform),
                error: Some(e.to_string()),
                update: None,
            }
        }
    }
}

/// Commit message for the updates that were actually written.
pub fn render_commit_message(git: &GitPlan, updates: Vec<PlatformUpdate>) -> String {
    let context = TemplateContext::new(git.bump_label.clone(), updates, git.date.clone());
    let message = context.render(&git.commit_template).trim().to_string();
    if message.is_empty() {
        default_commit_message(&context)
    } else {
        message
    }
}

fn run_git_workflow(
    plan: &GitPlan,
    updates: Vec<PlatformUpdate>,
    backend: &dyn GitBackend,
    session: &mut dyn Interaction,
) -> (BumpResult, GitWorkflowResult) {
    let mut workflow = GitWorkflowResult::default();
    let mut completed: Vec<String> = Vec::new();

    match git_steps(plan, updates, backend, session, &mut workflow, &mut completed) {
        Ok(()) => {
            info!(steps = completed.len(), "git workflow finished");
            let result = BumpResult {
                platform: GIT_LABEL.to_string(),
                success: true,
                old_version: String::new(),
                new_version: workflow
                    .tag_name
                    .clone()
                    .or_else(|| workflow.branch_name.clone())
                    .unwrap_or_default(),
                message: completed.join(", "),
                error: None,
                update: None,
            };
            (result, workflow)
        }
        Err((step, e)) => {
            warn!(step, error = %e, "git workflow stopped");
            let message = if completed.is_empty() {
                format!("Git workflow failed at {}", step)
            } else {
                format!(
                    "Git workflow failed at {} (completed: {})",
                    step,
                    completed.join(", ")
                )
            };
            (git_failure(&message, &e.to_string()), workflow)
        }
    }
}

type StepError = (&'static str, BumpError);

fn git_steps(
    plan: &GitPlan,
    updates: Vec<PlatformUpdate>,
    backend: &dyn GitBackend,
    session: &mut dyn Interaction,
    workflow: &mut GitWorkflowResult,
    completed: &mut Vec<String>,
) -> std::result::Result<(), StepError> {
    if let Some(branch) = &plan.branch {
        backend
            .create_branch(branch)
            .map_err(|e| ("branch", e))?;
        workflow.branch_created = true;
        workflow.branch_name = Some(branch.clone());
        completed.push(format!("created branch {}", branch));
    }

    let message = render_commit_message(plan, updates);
    backend.add_all().map_err(|e| ("commit", e))?;
    let hash = backend.commit(&message).map_err(|e| ("commit", e))?;
    workflow.committed = true;
    workflow.commit_message = Some(message);
    completed.push(format!("committed {}", hash));

    if let Some(tag) = &plan.tag {
        let tag_message = format!("Release {}", tag);
        match backend.create_tag(tag, &tag_message) {
            Ok(()) => {
                workflow.tagged = true;
            }
            Err(BumpError::TagExists(_)) => {
                let prompt = format!("Tag '{}' already exists. Overwrite it?", tag);
                let overwrite = session
                    .confirm_overwrite(&prompt)
                    .map_err(|e| ("tag", BumpError::git_command(e.to_string())))?;
                if overwrite {
                    backend.delete_tag(tag).map_err(|e| ("tag", e))?;
                    backend
                        .create_tag(tag, &tag_message)
                        .map_err(|e| ("tag", e))?;
                    workflow.tagged = true;
                } else {
                    debug!(tag = tag.as_str(), "kept existing tag");
                    completed.push(format!("kept existing tag {}", tag));
                }
            }
            Err(e) => return Err(("tag", e)),
        }
        if workflow.tagged {
            workflow.tag_name = Some(tag.clone());
            completed.push(format!("tagged {}", tag));
        }
    }

    if plan.push {
        let branch = match &workflow.branch_name {
            Some(branch) => branch.clone(),
            None => backend.current_branch().map_err(|e| ("push", e))?,
        };
        let mut refspecs = vec![format!("refs/heads/{0}:refs/heads/{0}", branch)];
        if let Some(tag) = &workflow.tag_name {
            refspecs.push(format!("refs/tags/{0}:refs/tags/{0}", tag));
        }
        backend
            .push(&plan.remote, &refspecs)
            .map_err(|e| ("push", e))?;
        workflow.pushed = true;
        workflow.remote = Some(plan.remote.clone());
        completed.push(format!("pushed to {}", plan.remote));
    }

    Ok(())
}

fn git_failure(message: &str, error: &str) -> BumpResult {
    BumpResult {
        platform: GIT_LABEL.to_string(),
        success: false,
        old_version: String::new(),
        new_version: String::new(),
        message: message.to_string(),
        error: Some(error.to_string()),
        update: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::plan::{build_plan, BumpIntent, GitRequest};
    use crate::snapshot::current_versions;
    use crate::ui::ScriptedSession;
    use crate::version::VersionBump;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            "{\n  \"name\": \"app\",\n  \"version\": \"1.0.0\"\n}\n",
        )
        .unwrap();
        let gradle = dir.path().join("android/app/build.gradle");
        fs::create_dir_all(gradle.parent().unwrap()).unwrap();
        fs::write(
            gradle,
            "android {\n    defaultConfig {\n        versionCode 1\n        versionName \"1.0.0\"\n    }\n}\n",
        )
        .unwrap();
        dir
    }

    fn request() -> GitRequest {
        GitRequest {
            create_branch: true,
            create_tag: true,
            push: true,
            remote: "origin".to_string(),
            branch_template: "release/v{version}".to_string(),
            commit_template: "chore: bump version to {version}\n\n{platformUpdates}".to_string(),
            tag_template: "v{version}".to_string(),
            latest_tag: None,
            date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_version_operations_only() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(&snapshot, &BumpIntent::Bump(VersionBump::Minor), None);

        let report = execute(
            dir.path(),
            &config,
            &plan,
            None,
            &mut ScriptedSession::default(),
        );

        assert_eq!(report.total(), 2);
        assert!(report.all_succeeded());
        assert!(report.git.is_none());
        assert_eq!(report.results[0].message, "Updated to 1.1.0");
        assert_eq!(report.results[1].new_version, "1.1.0 (2)");
    }

    #[test]
    fn test_full_git_workflow() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(
            &snapshot,
            &BumpIntent::Bump(VersionBump::Patch),
            Some(&request()),
        );
        let repo = MockRepository::new();

        let report = execute(
            dir.path(),
            &config,
            &plan,
            Some(&repo),
            &mut ScriptedSession::default(),
        );

        assert_eq!(report.successful(), 3);
        assert_eq!(
            repo.calls(),
            vec![
                "checkout -b release/v1.0.1",
                "add -A",
                "commit -m chore: bump version to 1.0.1",
                "tag v1.0.1",
                "push origin refs/heads/release/v1.0.1:refs/heads/release/v1.0.1 refs/tags/v1.0.1:refs/tags/v1.0.1",
            ]
        );
        let git = report.git.unwrap();
        assert!(git.branch_created && git.committed && git.tagged && git.pushed);
        assert_eq!(
            git.commit_message.as_deref(),
            Some("chore: bump version to 1.0.1\n\nPackage: 1.0.1, Android: 1.0.1 (2)")
        );
    }

    #[test]
    fn test_git_without_backend_fails_once() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(
            &snapshot,
            &BumpIntent::Bump(VersionBump::Patch),
            Some(&request()),
        );

        let report = execute(
            dir.path(),
            &config,
            &plan,
            None,
            &mut ScriptedSession::default(),
        );

        assert_eq!(report.total(), 3);
        assert_eq!(report.successful(), 2);
        let git = report.results.last().unwrap();
        assert_eq!(git.platform, "Git");
        assert!(!git.success);
    }

    #[test]
    fn test_push_failure_lists_completed_steps() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(
            &snapshot,
            &BumpIntent::Bump(VersionBump::Patch),
            Some(&request()),
        );
        let repo = MockRepository::new().fail_on("push");

        let report = execute(
            dir.path(),
            &config,
            &plan,
            Some(&repo),
            &mut ScriptedSession::default(),
        );

        let git_result = report.results.last().unwrap();
        assert!(!git_result.success);
        assert!(git_result.message.starts_with("Git workflow failed at push"));
        assert!(git_result.message.contains("created branch release/v1.0.1"));
        assert!(git_result.message.contains("tagged v1.0.1"));
        let git = report.git.unwrap();
        assert!(git.tagged);
        assert!(!git.pushed);
    }

    #[test]
    fn test_existing_tag_declined() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(
            &snapshot,
            &BumpIntent::Bump(VersionBump::Patch),
            Some(&request()),
        );
        let repo = MockRepository::new().with_tag("v1.0.1");
        let mut session = ScriptedSession::new([false]);

        let report = execute(dir.path(), &config, &plan, Some(&repo), &mut session);

        assert_eq!(session.prompts().len(), 1);
        let git = report.git.unwrap();
        assert!(!git.tagged);
        assert!(git.pushed);
        assert!(!repo.calls().iter().any(|c| c.starts_with("tag")));
        assert!(repo
            .calls()
            .last()
            .unwrap()
            .ends_with("refs/heads/release/v1.0.1:refs/heads/release/v1.0.1"));
    }

    #[test]
    fn test_existing_tag_overwritten() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(
            &snapshot,
            &BumpIntent::Bump(VersionBump::Patch),
            Some(&request()),
        );
        let repo = MockRepository::new().with_tag("v1.0.1");

        let report = execute(
            dir.path(),
            &config,
            &plan,
            Some(&repo),
            &mut ScriptedSession::new([true]),
        );

        assert!(report.git.unwrap().tagged);
        assert!(repo.calls().contains(&"tag -d v1.0.1".to_string()));
        assert!(repo.calls().contains(&"tag v1.0.1".to_string()));
    }

    #[test]
    fn test_no_successful_update_skips_git() {
        let dir = project();
        let config = Config::default();
        let snapshot = current_versions(dir.path(), &config);
        let plan = build_plan(
            &snapshot,
            &BumpIntent::Bump(VersionBump::Patch),
            Some(&request()),
        );
        fs::remove_file(dir.path().join("package.json")).unwrap();
        fs::remove_file(dir.path().join("android/app/build.gradle")).unwrap();
        let repo = MockRepository::new();

        let report = execute(
            dir.path(),
            &config,
            &plan,
            Some(&repo),
            &mut ScriptedSession::default(),
        );

        assert_eq!(report.successful(), 0);
        assert_eq!(
            report.results.last().unwrap().error.as_deref(),
            Some("no manifest was updated")
        );
        assert!(repo.calls().is_empty());
    }
}
