//! Batch planning: from the current snapshot and the user's intent to an
//! ordered list of manifest edits followed by git steps.

use std::fmt;

use tracing::{debug, info};

use crate::boundary::BoundaryWarning;
use crate::config::GitConfig;
use crate::platform::{display_version, Platform, PlatformVersion};
use crate::snapshot::{UnreadableManifest, VersionSnapshot};
use crate::template::{resolve_name, today, NameKind, PlatformUpdate, TemplateContext};
use crate::version::{bump, VersionBump};

/// A version and optional build number supplied by the user for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomVersion {
    pub version: String,
    pub build: Option<u64>,
}

/// Per-platform custom versions; platforms without an entry are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomVersions {
    pub package: Option<CustomVersion>,
    pub android: Option<CustomVersion>,
    pub ios: Option<CustomVersion>,
}

impl CustomVersions {
    /// The same version for every platform, build numbers advancing by one.
    pub fn uniform(version: impl Into<String>) -> Self {
        let entry = CustomVersion {
            version: version.into(),
            build: None,
        };
        CustomVersions {
            package: Some(entry.clone()),
            android: Some(entry.clone()),
            ios: Some(entry),
        }
    }

    pub fn get(&self, platform: Platform) -> Option<&CustomVersion> {
        match platform {
            Platform::Package => self.package.as_ref(),
            Platform::Android => self.android.as_ref(),
            Platform::Ios => self.ios.as_ref(),
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum BumpIntent {
    /// Increment each platform's own version.
    Bump(VersionBump),
    /// Set every platform to one version; `None` keeps each version as is.
    /// Build numbers advance either way.
    Sync { target: Option<String> },
    /// Caller-supplied versions and build numbers.
    Custom(CustomVersions),
}

impl BumpIntent {
    /// Label used for `{type}` and in summaries.
    pub fn label(&self) -> String {
        match self {
            BumpIntent::Bump(kind) => kind.to_string(),
            BumpIntent::Sync { .. } => "sync".to_string(),
            BumpIntent::Custom(_) => "custom".to_string(),
        }
    }
}

/// One step of the git release workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum GitStep {
    CreateBranch(String),
    Commit(String),
    Tag(String),
    Push {
        remote: String,
        branch: Option<String>,
        tag: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Version,
    Git,
}

/// What an operation acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationTarget {
    Manifest {
        platform: Platform,
        version: String,
        build: Option<u64>,
    },
    Git(GitStep),
}

/// A planned mutation, immutable once planned.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperation {
    pub target: OperationTarget,
    pub action: String,
    pub old_value: String,
    pub new_value: String,
    pub description: String,
}

impl BatchOperation {
    pub fn kind(&self) -> OperationKind {
        match self.target {
            OperationTarget::Manifest { .. } => OperationKind::Version,
            OperationTarget::Git(_) => OperationKind::Git,
        }
    }

    /// `Package`, `Android`, `iOS` or `Git`.
    pub fn platform_label(&self) -> &'static str {
        match &self.target {
            OperationTarget::Manifest { platform, .. } => platform.label(),
            OperationTarget::Git(_) => "Git",
        }
    }

    /// The structured update a version operation will write.
    pub fn update(&self) -> Option<PlatformUpdate> {
        match &self.target {
            OperationTarget::Manifest {
                platform,
                version,
                build,
            } => Some(PlatformUpdate {
                platform: *platform,
                version: version.clone(),
                build: *build,
            }),
            OperationTarget::Git(_) => None,
        }
    }
}

/// Which git steps the user wants, plus the naming inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct GitRequest {
    pub create_branch: bool,
    pub create_tag: bool,
    pub push: bool,
    pub remote: String,
    pub branch_template: String,
    pub commit_template: String,
    pub tag_template: String,
    /// Most recent tag, used when no version can name the release.
    pub latest_tag: Option<String>,
    /// `YYYY-MM-DD` for `{date}`.
    pub date: String,
}

impl GitRequest {
    /// Request built from configuration; the step toggles still need resolving.
    pub fn from_config(git: &GitConfig, latest_tag: Option<String>) -> Self {
        GitRequest {
            create_branch: !git.skip_branch,
            create_tag: !git.skip_tag,
            push: !git.skip_push,
            remote: git.remote.clone(),
            branch_template: git.branch_template.clone(),
            commit_template: git.commit_template.clone(),
            tag_template: git.tag_template.clone(),
            latest_tag,
            date: today(),
        }
    }
}

/// The resolved git leg of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct GitPlan {
    pub branch: Option<String>,
    /// Message rendered from the planned updates, shown in the preview.
    pub commit_message: String,
    /// Template re-rendered at commit time from the updates that succeeded.
    pub commit_template: String,
    pub tag: Option<String>,
    pub push: bool,
    pub remote: String,
    pub bump_label: String,
    pub date: String,
    pub latest_tag: Option<String>,
}

/// Ordered operations plus the git configuration, created per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchExecutionPlan {
    pub operations: Vec<BatchOperation>,
    pub git: Option<GitPlan>,
    pub summary: String,
    pub warnings: Vec<BoundaryWarning>,
    /// Platforms a sync leaves untouched; reported as "No change" on execution.
    pub unchanged: Vec<PlatformVersion>,
    /// Platforms whose manifest exists but could not be read; reported as failed.
    pub failed: Vec<UnreadableManifest>,
}

impl BatchExecutionPlan {
    pub fn version_operations(&self) -> impl Iterator<Item = &BatchOperation> {
        self.operations
            .iter()
            .filter(|op| op.kind() == OperationKind::Version)
    }

    pub fn git_operations(&self) -> impl Iterator<Item = &BatchOperation> {
        self.operations
            .iter()
            .filter(|op| op.kind() == OperationKind::Git)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for BatchExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// Computes the new (version, build) for one platform, or `None` to leave it out.
fn target_state(
    record: &PlatformVersion,
    intent: &BumpIntent,
) -> Option<(String, Option<u64>)> {
    let old_version = record.version();
    let next_build = record.build_number().map(|b| b.saturating_add(1));

    match intent {
        BumpIntent::Bump(kind) => Some((bump(old_version, *kind), next_build)),
        BumpIntent::Sync { target } => {
            let version = target.clone().unwrap_or_else(|| old_version.to_string());
            // The package manifest has no build counter, so an unchanged sync is a no-op.
            if record.platform() == Platform::Package && version == old_version {
                return None;
            }
            Some((version, next_build))
        }
        BumpIntent::Custom(custom) => {
            let entry = custom.get(record.platform())?;
            let build = match record.build_number() {
                Some(_) => entry.build.or(next_build),
                None => None,
            };
            Some((entry.version.clone(), build))
        }
    }
}

/// Builds the ordered plan: package, Android, iOS, then branch, commit, tag, push.
pub fn build_plan(
    snapshot: &VersionSnapshot,
    intent: &BumpIntent,
    git: Option<&GitRequest>,
) -> BatchExecutionPlan {
    let label = intent.label();
    let mut operations = Vec::new();
    let mut unchanged = Vec::new();

    // A custom intent only touches the platforms it names.
    let failed: Vec<UnreadableManifest> = snapshot
        .unreadable
        .iter()
        .filter(|entry| match intent {
            BumpIntent::Custom(custom) => custom.get(entry.platform).is_some(),
            _ => true,
        })
        .cloned()
        .collect();

    for record in snapshot.records() {
        let platform = record.platform();
        let Some((version, build)) = target_state(&record, intent) else {
            debug!(%platform, "no change planned");
            if matches!(intent, BumpIntent::Sync { .. }) {
                unchanged.push(record);
            }
            continue;
        };

        let old_value = record.to_string();
        let new_value = display_version(&version, build);
        operations.push(BatchOperation {
            action: format!("Update {} version", platform),
            description: format!("{}: {} → {}", platform, old_value, new_value),
            old_value,
            new_value,
            target: OperationTarget::Manifest {
                platform,
                version,
                build,
            },
        });
    }

    let updates: Vec<PlatformUpdate> = operations.iter().filter_map(|op| op.update()).collect();
    let version_count = operations.len();

    let mut warnings = Vec::new();
    let git_plan = match git {
        Some(request) if version_count > 0 => {
            let plan = plan_git(request, &label, updates, &mut warnings);
            push_git_operations(&mut operations, &plan);
            Some(plan)
        }
        _ => None,
    };

    let git_count = operations.len() - version_count;
    let summary = format!(
        "{} version update(s), {} git step(s) ({})",
        version_count, git_count, label
    );
    info!(%summary, "built batch plan");

    BatchExecutionPlan {
        operations,
        git: git_plan,
        summary,
        warnings,
        unchanged,
        failed,
    }
}

fn plan_git(
    request: &GitRequest,
    label: &str,
    updates: Vec<PlatformUpdate>,
    warnings: &mut Vec<BoundaryWarning>,
) -> GitPlan {
    let context = TemplateContext::new(label, updates, request.date.clone());
    let latest_tag = request.latest_tag.as_deref();

    let mut resolve = |kind: NameKind, template: &str| {
        let (name, fallback) = resolve_name(kind, template, &context, latest_tag);
        if fallback {
            debug!(?kind, template, %name, "template fell back to default name");
            warnings.push(BoundaryWarning::NameFallback {
                kind: match kind {
                    NameKind::Branch => "Branch".to_string(),
                    NameKind::Tag => "Tag".to_string(),
                },
                template: template.to_string(),
                name: name.clone(),
            });
        }
        name
    };
    let branch = request
        .create_branch
        .then(|| resolve(NameKind::Branch, &request.branch_template));
    let tag = request
        .create_tag
        .then(|| resolve(NameKind::Tag, &request.tag_template));

    let mut commit_message = context.render(&request.commit_template).trim().to_string();
    if commit_message.is_empty() {
        commit_message = default_commit_message(&context);
    }

    GitPlan {
        branch,
        commit_message,
        commit_template: request.commit_template.clone(),
        tag,
        push: request.push,
        remote: request.remote.clone(),
        bump_label: label.to_string(),
        date: request.date.clone(),
        latest_tag: request.latest_tag.clone(),
    }
}

/// Used when the commit template renders to nothing.
pub fn default_commit_message(context: &TemplateContext) -> String {
    format!(
        "chore: bump version to {}",
        context.primary_version().unwrap_or("0.0.0")
    )
}

fn push_git_operations(operations: &mut Vec<BatchOperation>, plan: &GitPlan) {
    if let Some(branch) = &plan.branch {
        operations.push(git_operation(
            GitStep::CreateBranch(branch.clone()),
            "Create branch",
            branch,
        ));
    }

    let first_line = plan.commit_message.lines().next().unwrap_or_default().to_string();
    operations.push(git_operation(
        GitStep::Commit(plan.commit_message.clone()),
        "Commit changes",
        &first_line,
    ));

    if let Some(tag) = &plan.tag {
        operations.push(git_operation(GitStep::Tag(tag.clone()), "Create tag", tag));
    }

    if plan.push {
        let destination = match (&plan.branch, &plan.tag) {
            (Some(branch), Some(tag)) => format!("{} ({}, {})", plan.remote, branch, tag),
            (Some(branch), None) => format!("{} ({})", plan.remote, branch),
            (None, Some(tag)) => format!("{} (current branch, {})", plan.remote, tag),
            (None, None) => format!("{} (current branch)", plan.remote),
        };
        operations.push(git_operation(
            GitStep::Push {
                remote: plan.remote.clone(),
                branch: plan.branch.clone(),
                tag: plan.tag.clone(),
            },
            "Push",
            &destination,
        ));
    }
}

fn git_operation(step: GitStep, action: &str, value: &str) -> BatchOperation {
    BatchOperation {
        target: OperationTarget::Git(step),
        action: action.to_string(),
        old_value: String::new(),
        new_value: value.to_string(),
        description: format!("{}: {}", action, value),
    }
}
