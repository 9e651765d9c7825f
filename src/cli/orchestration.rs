//! Main workflow orchestration logic
//!
//! This module contains the bump, sync, show and toggle workflows behind the
//! CLI subcommands. It provides a clean separation between CLI argument
//! parsing and business logic.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use tracing::{info, warn};

use crate::boundary::BoundaryWarning;
use crate::config::{self, Config, CONFIG_FILE_NAME};
use crate::error::BumpError;
use crate::executor::{execute, ExecutionReport};
use crate::git::{follow_up_links, Git2Repository, GitBackend};
use crate::lens::version_lenses;
use crate::plan::{build_plan, BatchExecutionPlan, BumpIntent, CustomVersion, CustomVersions, GitRequest};
use crate::snapshot::{self, VersionSnapshot};
use crate::ui::{self, Interaction};
use crate::version::{highest_version, is_release_version};

/// Arguments shared by the bump and sync workflows
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
/// This decoupling allows the workflow to be called programmatically
/// without depending on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowArgs {
    /// Project root holding the manifests
    pub root: PathBuf,

    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    /// Preview only; nothing is written
    pub dry_run: bool,

    /// `Some(true)` for `--git`, `Some(false)` for `--no-git`, `None` to follow the config
    pub git: Option<bool>,
}

impl WorkflowArgs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkflowArgs {
            root: root.into(),
            config_path: None,
            dry_run: false,
            git: None,
        }
    }
}

/// Versions passed to `bump custom`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomVersionArgs {
    /// Applies to every platform without its own value
    pub version: Option<String>,
    pub package_version: Option<String>,
    pub android_version: Option<String>,
    pub android_build: Option<u64>,
    pub ios_version: Option<String>,
    pub ios_build: Option<u64>,
}

impl CustomVersionArgs {
    pub fn is_empty(&self) -> bool {
        *self == CustomVersionArgs::default()
    }

    /// Turns the flags into a custom intent.
    ///
    /// A platform with only a build number keeps `fallback` as its version.
    ///
    /// # Returns
    /// * `Err` - If no version was given or a version is not `major.minor.patch`
    pub fn into_intent(self, snapshot: &VersionSnapshot) -> Result<BumpIntent> {
        if self.is_empty() {
            bail!("`bump custom` needs --version or a per-platform version");
        }

        let current = |version: Option<String>| version.unwrap_or_default();
        let entry = |specific: Option<String>,
                     build: Option<u64>,
                     existing: String|
         -> Result<Option<CustomVersion>> {
            let version = match specific.or_else(|| self.version.clone()) {
                Some(version) => version,
                None if build.is_some() => existing,
                None => return Ok(None),
            };
            if !is_release_version(&version) {
                bail!("Invalid version '{}': expected major.minor.patch", version);
            }
            Ok(Some(CustomVersion { version, build }))
        };

        Ok(BumpIntent::Custom(CustomVersions {
            package: entry(
                self.package_version.clone(),
                None,
                current(snapshot.package.as_ref().map(|p| p.version.clone())),
            )?,
            android: entry(
                self.android_version.clone(),
                self.android_build,
                current(snapshot.android.as_ref().map(|a| a.version_name.clone())),
            )?,
            ios: entry(
                self.ios_version.clone(),
                self.ios_build,
                current(snapshot.ios.as_ref().map(|i| i.version.clone())),
            )?,
        }))
    }
}

/// How a bump or sync workflow ended
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowResult {
    /// The plan had no operations
    NothingToDo,
    /// `--dry-run`: the plan was previewed only
    DryRun(BatchExecutionPlan),
    Executed(ExecutionReport),
}

/// Runs a bump or sync.
///
/// Orchestrates the entire release:
/// 1. Load configuration and collect current versions
/// 2. Resolve the git options (asking when the config says so)
/// 3. Build and preview the plan
/// 4. Stop there on a dry run; otherwise confirm, then execute
/// 5. Show the results and the follow-up links of a pushed release
///
/// # Arguments
///
/// * `args` - Workflow arguments (root, config, dry_run, git override)
/// * `intent` - What to do with the versions; a sync without target goes to
///   the highest current version
/// * `session` - Answers the confirmation prompts
///
/// # Returns
///
/// * `Err(BumpError::UserCancelled)` - If the preview was declined
pub fn run_workflow(
    args: &WorkflowArgs,
    intent: BumpIntent,
    session: &mut dyn Interaction,
) -> Result<WorkflowResult> {
    let config = config::load_config(&args.root, args.config_path.as_deref())?;
    let snapshot = collect_snapshot(&args.root, &config)?;
    ui::display_snapshot(&snapshot);

    let intent = match intent {
        BumpIntent::Sync { target: None } => {
            let target = highest_version(&snapshot.semantic_versions())
                .ok_or_else(|| anyhow!("No version to synchronize to"))?;
            info!(%target, "syncing to highest current version");
            BumpIntent::Sync {
                target: Some(target),
            }
        }
        other => other,
    };

    let git_enabled = args.git.unwrap_or(config.git.enabled);
    let backend = if git_enabled {
        open_repository(&args.root)
    } else {
        None
    };
    let request = if git_enabled {
        Some(git_request(&config, backend.as_ref(), session)?)
    } else {
        None
    };

    let plan = build_plan(&snapshot, &intent, request.as_ref());
    for warning in &plan.warnings {
        ui::display_boundary_warning(warning);
    }
    if plan.is_empty() {
        ui::display_status("Nothing to update");
        return Ok(WorkflowResult::NothingToDo);
    }

    ui::display_plan(&plan);
    if args.dry_run {
        ui::display_status("Dry run: no files were changed");
        return Ok(WorkflowResult::DryRun(plan));
    }

    if !session.confirm("Apply these changes?")? {
        return Err(BumpError::UserCancelled.into());
    }

    let report = execute(
        &args.root,
        &config,
        &plan,
        backend.as_ref().map(|repo| repo as &dyn GitBackend),
        session,
    );
    ui::display_results(&report);

    if let (Some(repo), Some(git)) = (backend.as_ref(), report.git.as_ref()) {
        if git.pushed {
            let remote = git.remote.as_deref().unwrap_or(&config.git.remote);
            match repo.remote_url(remote) {
                Ok(Some(url)) => {
                    let links =
                        follow_up_links(&url, git.tag_name.as_deref(), git.branch_name.as_deref());
                    if let Some(links) = links {
                        ui::display_follow_up_links(&links);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "could not read remote url"),
            }
        }
    }

    Ok(WorkflowResult::Executed(report))
}

/// Prints the current versions and, when enabled, where they live.
pub fn show(root: &Path, config_path: Option<&Path>) -> Result<VersionSnapshot> {
    let config = config::load_config(root, config_path)?;
    let snapshot = collect_snapshot(root, &config)?;
    ui::display_snapshot(&snapshot);

    if config.ui.code_lens {
        ui::display_lenses(&version_lenses(root, &config));
    }
    Ok(snapshot)
}

/// Flips `ui.code_lens` in the configuration file in effect.
///
/// Without any configuration file a new `mobilebump.toml` is created in the
/// project root.
///
/// # Returns
///
/// The new setting
pub fn toggle_code_lens(root: &Path, config_path: Option<&Path>) -> Result<bool> {
    let path =
        config::config_path(root, config_path).unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    let mut config = if path.exists() {
        config::load_config_file(&path)?
    } else {
        Config::default()
    };

    config.ui.code_lens = !config.ui.code_lens;
    config::save_config(&path, &config)?;
    info!(path = %path.display(), enabled = config.ui.code_lens, "toggled version lenses");
    Ok(config.ui.code_lens)
}

fn collect_snapshot(root: &Path, config: &Config) -> Result<VersionSnapshot> {
    let (snapshot, warnings) = snapshot::collect(root, config);
    for warning in &warnings {
        ui::display_boundary_warning(warning);
    }
    if snapshot.has_no_manifests() {
        bail!("No version manifests to update in '{}'", root.display());
    }
    Ok(snapshot)
}

fn open_repository(root: &Path) -> Option<Git2Repository> {
    match Git2Repository::open(root) {
        Ok(repo) => Some(repo),
        Err(e) => {
            ui::display_boundary_warning(&BoundaryWarning::RepositoryUnavailable {
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Git options from the config, asking for branch and tag creation when the
/// config does not create them automatically.
fn git_request(
    config: &Config,
    backend: Option<&Git2Repository>,
    session: &mut dyn Interaction,
) -> Result<GitRequest> {
    let latest_tag = match backend.map(|repo| repo.latest_tag()) {
        Some(Ok(tag)) => tag,
        Some(Err(e)) => {
            warn!(error = %e, "could not determine latest tag");
            None
        }
        None => None,
    };

    let mut request = GitRequest::from_config(&config.git, latest_tag);
    if request.create_branch && !config.git.auto_create_branch {
        request.create_branch = session.confirm("Create a release branch?")?;
    }
    if request.create_tag && !config.git.auto_create_tag {
        request.create_tag = session.confirm("Create a release tag?")?;
    }
    Ok(request)
}
