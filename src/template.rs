//! Placeholder templates for branch names, commit messages and tag names.
//!
//! Supported placeholders: `{type}`, `{version}`, `{date}`, `{packageVersion}`,
//! `{androidVersion}`, `{iosVersion}`, `{androidBuildNumber}`,
//! `{iosBuildNumber}` and `{platformUpdates}`. A placeholder without a value
//! renders as `unknown`.

use regex::Regex;

use crate::platform::{display_version, Platform};
use crate::version::parse_version_from_tag;

const UNKNOWN: &str = "unknown";

/// The new state of one platform, as written (or about to be written).
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformUpdate {
    pub platform: Platform,
    pub version: String,
    pub build: Option<u64>,
}

impl PlatformUpdate {
    /// `"Android: 1.0.1 (2)"`
    pub fn describe(&self) -> String {
        format!(
            "{}: {}",
            self.platform,
            display_version(&self.version, self.build)
        )
    }
}

/// What a generated name is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Branch,
    Tag,
}

impl NameKind {
    fn prefix(&self) -> &'static str {
        match self {
            NameKind::Branch => "release/",
            NameKind::Tag => "",
        }
    }
}

/// Local date as used for `{date}`: `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Values available to templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateContext {
    /// `major`, `minor`, `patch`, `sync` or `custom`.
    pub bump_label: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub updates: Vec<PlatformUpdate>,
}

impl TemplateContext {
    pub fn new(bump_label: impl Into<String>, updates: Vec<PlatformUpdate>, date: impl Into<String>) -> Self {
        TemplateContext {
            bump_label: bump_label.into(),
            date: date.into(),
            updates,
        }
    }

    pub fn update(&self, platform: Platform) -> Option<&PlatformUpdate> {
        self.updates.iter().find(|u| u.platform == platform)
    }

    /// The version shared by every update, if there is exactly one.
    pub fn shared_version(&self) -> Option<&str> {
        let first = self.updates.first()?;
        self.updates
            .iter()
            .all(|u| u.version == first.version)
            .then_some(first.version.as_str())
    }

    /// The value of `{version}`: the shared version, else package, Android, iOS.
    pub fn primary_version(&self) -> Option<&str> {
        self.shared_version().or_else(|| {
            [Platform::Package, Platform::Android, Platform::Ios]
                .into_iter()
                .find_map(|p| self.update(p).map(|u| u.version.as_str()))
        })
    }

    /// `"Android: 1.0.1 (2), iOS: 1.0.1 (2)"`
    pub fn platform_updates(&self) -> String {
        self.updates
            .iter()
            .map(PlatformUpdate::describe)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn render(&self, template: &str) -> String {
        let version_of = |platform| {
            self.update(platform)
                .map(|u| u.version.clone())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        let build_of = |platform| {
            self.update(platform)
                .and_then(|u| u.build)
                .map(|b| b.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        let updates = if self.updates.is_empty() {
            UNKNOWN.to_string()
        } else {
            self.platform_updates()
        };

        template
            .replace("{type}", &self.bump_label)
            .replace("{version}", self.primary_version().unwrap_or(UNKNOWN))
            .replace("{date}", &self.date)
            .replace("{packageVersion}", &version_of(Platform::Package))
            .replace("{androidVersion}", &version_of(Platform::Android))
            .replace("{iosVersion}", &version_of(Platform::Ios))
            .replace("{androidBuildNumber}", &build_of(Platform::Android))
            .replace("{iosBuildNumber}", &build_of(Platform::Ios))
            .replace("{platformUpdates}", &updates)
    }
}

/// Checks a rendered branch or tag name.
///
/// A name is rejected when it equals the raw template, is blank, is only the
/// template's static text (or ends in `/`), contains `unknown`, or is missing
/// any updated platform's new version.
pub fn is_valid_name(name: &str, template: &str, context: &TemplateContext) -> bool {
    let name = name.trim();
    if name.is_empty() || name == template || name.ends_with('/') || name.contains(UNKNOWN) {
        return false;
    }
    if name == strip_placeholders(template).trim() {
        return false;
    }
    context
        .updates
        .iter()
        .all(|update| name.contains(&update.version))
}

fn strip_placeholders(template: &str) -> String {
    match Regex::new(r"\{[A-Za-z]+\}") {
        Ok(re) => re.replace_all(template, "").into_owned(),
        Err(_) => template.to_string(),
    }
}

/// Deterministic fallback name.
///
/// Priority: a version shared by all updates; Android and iOS combined; the
/// single updated platform; the latest git tag's version.
pub fn default_name(kind: NameKind, context: &TemplateContext, latest_tag: Option<&str>) -> String {
    let prefix = kind.prefix();
    if let Some(version) = context.shared_version() {
        return format!("{}v{}", prefix, version);
    }

    if let (Some(android), Some(ios)) = (
        context.update(Platform::Android),
        context.update(Platform::Ios),
    ) {
        return format!(
            "{}android-v{}-ios-v{}",
            prefix, android.version, ios.version
        );
    }

    let single = [Platform::Android, Platform::Ios, Platform::Package]
        .into_iter()
        .find_map(|p| context.update(p));
    if let Some(update) = single {
        return format!("{}v{}", prefix, update.version);
    }

    let tag_version = latest_tag
        .and_then(parse_version_from_tag)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "0.0.0".to_string());
    format!("{}v{}", prefix, tag_version)
}

/// Renders a name template, falling back to [`default_name`] when the result is
/// not usable. The flag reports whether the fallback was taken.
pub fn resolve_name(
    kind: NameKind,
    template: &str,
    context: &TemplateContext,
    latest_tag: Option<&str>,
) -> (String, bool) {
    let rendered = context.render(template);
    if is_valid_name(&rendered, template, context) {
        (rendered.trim().to_string(), false)
    } else {
        (default_name(kind, context, latest_tag), true)
    }
}
