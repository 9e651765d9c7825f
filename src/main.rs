use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use mobile_bump::cli::{self, CustomVersionArgs, WorkflowArgs, WorkflowResult};
use mobile_bump::plan::BumpIntent;
use mobile_bump::ui::{self, TerminalSession};
use mobile_bump::version::{is_release_version, VersionBump};
use mobile_bump::BumpError;

#[derive(Parser)]
#[command(
    name = "mobile-bump",
    version,
    about = "Bump app versions across package.json, Android and iOS manifests"
)]
struct Args {
    #[arg(long, global = true, default_value = ".", help = "Project root")]
    root: PathBuf,

    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short = 'y', long, global = true, help = "Skip confirmation prompts")]
    yes: bool,

    #[arg(
        long,
        global = true,
        help = "Preview what would happen without making changes"
    )]
    dry_run: bool,

    #[arg(
        long,
        global = true,
        help = "Overwrite an existing release tag without asking"
    )]
    force_tags: bool,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bump every platform's version
    Bump {
        kind: BumpKind,

        #[arg(long, help = "Version for every platform (custom only)")]
        version: Option<String>,

        #[arg(long)]
        package_version: Option<String>,

        #[arg(long)]
        android_version: Option<String>,

        #[arg(long, help = "Android versionCode")]
        android_build: Option<u64>,

        #[arg(long)]
        ios_version: Option<String>,

        #[arg(long, help = "iOS CFBundleVersion")]
        ios_build: Option<u64>,

        #[command(flatten)]
        git: GitFlags,
    },

    /// Set every platform to one version (default: the highest current one)
    Sync {
        version: Option<String>,

        #[command(flatten)]
        git: GitFlags,
    },

    /// Show the current versions
    Show,

    /// Turn the version field annotations of `show` on or off
    ToggleCodeLens,
}

#[derive(Clone, Copy, ValueEnum)]
enum BumpKind {
    Major,
    Minor,
    Patch,
    Custom,
}

#[derive(clap::Args)]
struct GitFlags {
    #[arg(long, conflicts_with = "no_git", help = "Run the git release workflow")]
    git: bool,

    #[arg(long, help = "Skip the git release workflow")]
    no_git: bool,
}

impl GitFlags {
    fn choice(&self) -> Option<bool> {
        match (self.git, self.no_git) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if matches!(e.downcast_ref::<BumpError>(), Some(BumpError::UserCancelled)) {
                println!("Operation cancelled by user.");
                return;
            }
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

/// Runs the selected command; `Ok(false)` means some operation failed.
fn run(args: Args) -> Result<bool> {
    let workflow = |git: &GitFlags| WorkflowArgs {
        root: args.root.clone(),
        config_path: args.config.clone(),
        dry_run: args.dry_run,
        git: git.choice(),
    };
    let mut session = TerminalSession::new(args.yes).with_force_overwrite(args.force_tags);

    let (workflow_args, intent) = match &args.command {
        Command::Show => {
            cli::show(&args.root, args.config.as_deref())?;
            return Ok(true);
        }
        Command::ToggleCodeLens => {
            let enabled = cli::toggle_code_lens(&args.root, args.config.as_deref())?;
            let state = if enabled { "enabled" } else { "disabled" };
            ui::display_success(&format!("Version annotations {}", state));
            return Ok(true);
        }
        Command::Sync { version, git } => {
            if let Some(version) = version {
                if !is_release_version(version) {
                    bail!("Invalid version '{}': expected major.minor.patch", version);
                }
            }
            (
                workflow(git),
                BumpIntent::Sync {
                    target: version.clone(),
                },
            )
        }
        Command::Bump {
            kind,
            version,
            package_version,
            android_version,
            android_build,
            ios_version,
            ios_build,
            git,
        } => {
            let custom = CustomVersionArgs {
                version: version.clone(),
                package_version: package_version.clone(),
                android_version: android_version.clone(),
                android_build: *android_build,
                ios_version: ios_version.clone(),
                ios_build: *ios_build,
            };
            if !matches!(kind, BumpKind::Custom) && !custom.is_empty() {
                bail!("Version options only apply to `bump custom`");
            }
            let intent = match kind {
                BumpKind::Major => BumpIntent::Bump(VersionBump::Major),
                BumpKind::Minor => BumpIntent::Bump(VersionBump::Minor),
                BumpKind::Patch => BumpIntent::Bump(VersionBump::Patch),
                BumpKind::Custom => {
                    let snapshot = mobile_bump::snapshot::current_versions(
                        &args.root,
                        &mobile_bump::config::load_config(&args.root, args.config.as_deref())?,
                    );
                    custom.into_intent(&snapshot)?
                }
            };
            (workflow(git), intent)
        }
    };

    let succeeded = match cli::run_workflow(&workflow_args, intent, &mut session)? {
        WorkflowResult::Executed(report) => report.all_succeeded(),
        WorkflowResult::NothingToDo | WorkflowResult::DryRun(_) => true,
    };
    Ok(succeeded)
}
