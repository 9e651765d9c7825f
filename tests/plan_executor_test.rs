use std::fs;
use std::path::Path;

use mobile_bump::config::Config;
use mobile_bump::executor::execute;
use mobile_bump::git::{GitBackend, MockRepository};
use mobile_bump::plan::{
    build_plan, BumpIntent, CustomVersion, CustomVersions, GitRequest, GitStep, OperationKind,
    OperationTarget,
};
use mobile_bump::snapshot::current_versions;
use mobile_bump::ui::{ScriptedSession, TerminalSession};
use mobile_bump::version::VersionBump;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn mobile_project(android: (&str, u64), ios: (&str, u64)) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "android/app/build.gradle",
        &format!(
            "android {{\n    defaultConfig {{\n        versionCode {}\n        versionName \"{}\"\n    }}\n}}\n",
            android.1, android.0
        ),
    );
    write(
        dir.path(),
        "ios/App/Info.plist",
        &format!(
            "<dict>\n\t<key>CFBundleShortVersionString</key>\n\t<string>{}</string>\n\t<key>CFBundleVersion</key>\n\t<string>{}</string>\n</dict>\n",
            ios.0, ios.1
        ),
    );
    dir
}

fn request(config: &Config) -> GitRequest {
    let mut request = GitRequest::from_config(&config.git, Some("v0.9.0".to_string()));
    request.date = "2024-05-01".to_string();
    request
}

#[test]
fn test_plan_ordering_invariant() {
    let dir = mobile_project(("1.0.0", 3), ("1.0.0", 3));
    write(dir.path(), "package.json", "{\"version\": \"1.0.0\"}\n");
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);

    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Minor),
        Some(&request(&config)),
    );

    let kinds: Vec<OperationKind> = plan.operations.iter().map(|op| op.kind()).collect();
    let first_git = kinds.iter().position(|k| *k == OperationKind::Git).unwrap();
    assert!(kinds[..first_git].iter().all(|k| *k == OperationKind::Version));
    assert!(kinds[first_git..].iter().all(|k| *k == OperationKind::Git));

    let labels: Vec<&str> = plan.operations.iter().map(|op| op.platform_label()).collect();
    assert_eq!(labels, vec!["Package", "Android", "iOS", "Git", "Git", "Git", "Git"]);

    let steps: Vec<&GitStep> = plan
        .operations
        .iter()
        .filter_map(|op| match &op.target {
            OperationTarget::Git(step) => Some(step),
            OperationTarget::Manifest { .. } => None,
        })
        .collect();
    assert!(matches!(steps[0], GitStep::CreateBranch(name) if name == "release/v1.1.0"));
    assert!(matches!(steps[1], GitStep::Commit(_)));
    assert!(matches!(steps[2], GitStep::Tag(name) if name == "v1.1.0"));
    assert!(matches!(steps[3], GitStep::Push { .. }));
    assert_eq!(plan.summary, "3 version update(s), 4 git step(s) (minor)");
}

#[test]
fn test_diverging_versions_use_combined_names() {
    let dir = mobile_project(("2.0.0", 20), ("2.1.0", 7));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new();

    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut ScriptedSession::default(),
    );

    assert!(report.all_succeeded());
    let git = report.git.as_ref().unwrap();
    assert_eq!(
        git.branch_name.as_deref(),
        Some("release/android-v2.0.1-ios-v2.1.1")
    );
    assert_eq!(git.tag_name.as_deref(), Some("android-v2.0.1-ios-v2.1.1"));
    // {version} falls back to the Android version when platforms disagree
    assert_eq!(
        git.commit_message.as_deref(),
        Some("chore: bump version to 2.0.1\n\nAndroid: 2.0.1 (21), iOS: 2.1.1 (8)")
    );
}

#[test]
fn test_skipped_git_steps_are_not_planned() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let mut config = Config::default();
    config.git.skip_branch = true;
    config.git.skip_push = true;
    let snapshot = current_versions(dir.path(), &config);

    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new();
    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut ScriptedSession::default(),
    );

    assert_eq!(plan.git_operations().count(), 2);
    assert_eq!(
        repo.calls(),
        vec!["add -A", "commit -m chore: bump version to 1.0.1", "tag v1.0.1"]
    );
    let git = report.git.as_ref().unwrap();
    assert!(!git.branch_created);
    assert!(!git.pushed);
}

#[test]
fn test_push_uses_current_branch_without_release_branch() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let mut config = Config::default();
    config.git.skip_branch = true;
    config.git.skip_tag = true;
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new();

    execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut ScriptedSession::default(),
    );

    assert_eq!(
        repo.calls().last().map(String::as_str),
        Some("push origin refs/heads/main:refs/heads/main")
    );
}

#[test]
fn test_commit_reflects_only_successful_updates() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    fs::remove_file(dir.path().join("ios/App/Info.plist")).unwrap();
    let repo = MockRepository::new();

    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut ScriptedSession::default(),
    );

    assert_eq!(report.successful(), 2);
    let message = report.git.unwrap().commit_message.unwrap();
    assert!(message.ends_with("Android: 1.0.1 (2)"));
    assert!(!message.contains("iOS"));
}

#[test]
fn test_branch_failure_stops_git_leg() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new().fail_on("checkout");

    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut ScriptedSession::default(),
    );

    assert_eq!(repo.calls(), vec!["checkout -b release/v1.0.1"]);
    let git_result = report.results.last().unwrap();
    assert_eq!(git_result.message, "Git workflow failed at branch");
    let git = report.git.as_ref().unwrap();
    assert!(!git.committed);
    // The manifests stay updated
    assert_eq!(report.successful(), 2);
}

#[test]
fn test_custom_intent_with_build_numbers() {
    let dir = mobile_project(("1.0.0", 10), ("1.0.0", 10));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let intent = BumpIntent::Custom(CustomVersions {
        package: None,
        android: Some(CustomVersion {
            version: "3.0.0".to_string(),
            build: Some(300),
        }),
        ios: Some(CustomVersion {
            version: "3.0.0".to_string(),
            build: None,
        }),
    });

    let plan = build_plan(&snapshot, &intent, None);
    let report = execute(
        dir.path(),
        &config,
        &plan,
        None,
        &mut ScriptedSession::default(),
    );

    assert!(report.all_succeeded());
    let after = current_versions(dir.path(), &config);
    assert_eq!(after.android.unwrap().version_code, 300);
    assert_eq!(after.ios.unwrap().build_number, "11");
}

#[test]
fn test_follow_up_links_for_pushed_release() {
    let repo = MockRepository::new().with_remote_url("git@github.com:acme/demo.git");
    let url = repo.remote_url("origin").unwrap().unwrap();

    let links =
        mobile_bump::git::follow_up_links(&url, Some("v1.0.1"), Some("release/v1.0.1")).unwrap();
    assert_eq!(
        links.create_release.as_deref(),
        Some("https://github.com/acme/demo/releases/new?tag=v1.0.1")
    );
}

#[test]
fn test_commit_failure_skips_tag_and_push() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new().fail_on("commit");

    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut ScriptedSession::default(),
    );

    let calls = repo.calls();
    assert_eq!(calls.last().map(String::as_str), Some("commit -m chore: bump version to 1.0.1"));
    assert!(!calls.iter().any(|c| c.starts_with("tag") || c.starts_with("push")));

    let git_result = report.results.last().unwrap();
    assert!(!git_result.success);
    assert_eq!(
        git_result.message,
        "Git workflow failed at commit (completed: created branch release/v1.0.1)"
    );
    let git = report.git.as_ref().unwrap();
    assert!(git.branch_created);
    assert!(!git.committed && !git.tagged && !git.pushed);
    assert_eq!(report.successful(), 2);
}

#[test]
fn test_tag_failure_skips_push() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new().fail_on("tag");
    let mut session = ScriptedSession::default();

    let report = execute(dir.path(), &config, &plan, Some(&repo), &mut session);

    let calls = repo.calls();
    assert_eq!(calls.last().map(String::as_str), Some("tag v1.0.1"));
    assert!(!calls.iter().any(|c| c.starts_with("push")));
    // A plain tag failure is not an existing tag, so nothing is asked
    assert!(session.prompts().is_empty());

    let git_result = report.results.last().unwrap();
    assert!(!git_result.success);
    assert!(git_result
        .message
        .starts_with("Git workflow failed at tag (completed: created branch release/v1.0.1, committed "));
    let git = report.git.as_ref().unwrap();
    assert!(git.committed);
    assert!(!git.tagged && !git.pushed);
}

#[test]
fn test_assume_yes_keeps_existing_tag() {
    let dir = mobile_project(("1.0.0", 1), ("1.0.0", 1));
    let config = Config::default();
    let snapshot = current_versions(dir.path(), &config);
    let plan = build_plan(
        &snapshot,
        &BumpIntent::Bump(VersionBump::Patch),
        Some(&request(&config)),
    );
    let repo = MockRepository::new().with_tag("v1.0.1");

    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&repo),
        &mut TerminalSession::new(true),
    );

    assert!(!repo.calls().iter().any(|c| c.starts_with("tag")));
    let git = report.git.as_ref().unwrap();
    assert!(!git.tagged);
    assert!(git.pushed);
    assert_eq!(
        repo.calls().last().map(String::as_str),
        Some("push origin refs/heads/release/v1.0.1:refs/heads/release/v1.0.1")
    );

    let forced = MockRepository::new().with_tag("v1.0.1");
    let report = execute(
        dir.path(),
        &config,
        &plan,
        Some(&forced),
        &mut TerminalSession::new(true).with_force_overwrite(true),
    );
    assert!(forced.calls().contains(&"tag -d v1.0.1".to_string()));
    assert!(report.git.unwrap().tagged);
}
