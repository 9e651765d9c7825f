//! Inline annotations for the version fields of each manifest.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::platform::{android, ios, Manifest, Platform, PlatformVersion};

const BUMP_HINT: &str = "bump: mobile-bump bump patch";

/// A version field location with the text shown next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionLens {
    pub platform: Platform,
    pub path: PathBuf,
    /// 1-based
    pub line: usize,
    pub label: String,
}

/// One lens per enabled platform whose manifest can be read.
///
/// Anchors: the package `"version"` line, the Android `versionName` line
/// inside `defaultConfig`, and the iOS `CFBundleShortVersionString` value line.
pub fn version_lenses(root: &Path, config: &Config) -> Vec<VersionLens> {
    Platform::ALL
        .into_iter()
        .filter(|platform| !platform.is_skipped(config))
        .filter_map(|platform| lens_for(root, Manifest::for_platform(platform, config)))
        .collect()
}

fn lens_for(root: &Path, manifest: Manifest) -> Option<VersionLens> {
    let platform = manifest.platform();
    let record = match manifest.read(root) {
        Ok(Some(record)) => record,
        Ok(None) => return None,
        Err(e) => {
            debug!(%platform, error = %e, "no lens for unreadable manifest");
            return None;
        }
    };
    let path = manifest.path(root)?;
    let content = fs::read_to_string(&path).ok()?;
    let index = anchor_line(&record, &content)?;

    Some(VersionLens {
        platform,
        path,
        line: index + 1,
        label: format!("{}: {} ({})", platform, record, BUMP_HINT),
    })
}

/// 0-based line of the field that carries the semantic version.
fn anchor_line(record: &PlatformVersion, content: &str) -> Option<usize> {
    match record {
        PlatformVersion::Package(_) => top_level_version_line(content),
        PlatformVersion::Android(_) => android::locate_fields(content)
            .ok()?
            .version_name
            .map(|(line, _)| line),
        PlatformVersion::Ios(_) => ios::locate_entries(content)
            .ok()?
            .version
            .map(|entry| entry.line),
    }
}

/// Line of the `"version"` key of the top-level object, skipping nested ones.
fn top_level_version_line(content: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in content.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            '"' => {
                if depth == 1 && is_version_key(&content[index..]) {
                    return Some(content[..index].matches('\n').count());
                }
                in_string = true;
            }
            _ => {}
        }
    }
    None
}

fn is_version_key(text: &str) -> bool {
    text.strip_prefix("\"version\"")
        .map(|rest| rest.trim_start().starts_with(':'))
        .unwrap_or(false)
}
