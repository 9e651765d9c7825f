//! `Info.plist` reader/writer with build-setting indirection.
//!
//! A plist value may be a literal (`<string>1.2.0</string>`) or a reference to
//! a build setting (`<string>$(MARKETING_VERSION)</string>`). References are
//! resolved against the Xcode project file, which is then also the file that
//! gets rewritten.

use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::{BumpError, Result};

use super::android::split_line_ending;
use super::read_optional;

const VERSION_KEY: &str = "CFBundleShortVersionString";
const BUILD_KEY: &str = "CFBundleVersion";
const DEFAULT_VERSION: &str = "0.0.0";
const DEFAULT_BUILD: &str = "0";

/// Version state of the iOS app.
#[derive(Debug, Clone, PartialEq)]
pub struct IosVersion {
    pub version: String,
    pub build_number: String,
    /// At least one of the plist values is a build-setting reference.
    pub uses_variables: bool,
    pub version_variable: Option<String>,
    pub build_variable: Option<String>,
    /// Project file the variables were resolved from.
    pub project_file: Option<PathBuf>,
}

impl IosVersion {
    /// The build number as a counter; non-numeric text counts as 0.
    pub fn build_number_value(&self) -> u64 {
        let digits: String = self
            .build_number
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }
}

/// Reader/writer for `Info.plist` and its companion `project.pbxproj`.
#[derive(Debug, Clone, Default)]
pub struct IosManifest {
    plist_override: Option<PathBuf>,
    project_override: Option<PathBuf>,
}

/// A plist value: the line holding its `<string>` and the raw text inside.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlistEntry {
    pub line: usize,
    pub value: String,
}

#[derive(Debug, Default)]
pub(crate) struct PlistEntries {
    pub version: Option<PlistEntry>,
    pub build: Option<PlistEntry>,
}

/// Assignment shapes for a build setting, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueShape {
    /// `NAME = "value";`
    Quoted,
    /// `NAME = value;`
    Semicolon,
    /// `NAME = 1.2.3`
    Bare,
}

impl ValueShape {
    const CHAIN: [ValueShape; 3] = [ValueShape::Quoted, ValueShape::Semicolon, ValueShape::Bare];

    /// Capture groups: 1 = `NAME = ` prefix, 2 = value, 3 = terminator.
    fn pattern(&self, name: &str) -> Result<Regex> {
        let name = regex::escape(name);
        let source = match self {
            ValueShape::Quoted => format!(r#"(\b{}\s*=\s*)"([^"]*)"(\s*;)"#, name),
            ValueShape::Semicolon => format!(r#"(\b{}\s*=\s*)([^;\s"]+)(\s*;)"#, name),
            ValueShape::Bare => format!(r"(\b{}\s*=\s*)([0-9][0-9.]*)()", name),
        };
        Ok(Regex::new(&source)?)
    }
}

impl IosManifest {
    pub fn new(plist_override: Option<PathBuf>, project_override: Option<PathBuf>) -> Self {
        IosManifest {
            plist_override,
            project_override,
        }
    }

    /// The configured plist, or the first `ios/<App>/Info.plist` found.
    pub fn plist_path(&self, root: &Path) -> Option<PathBuf> {
        match &self.plist_override {
            Some(custom) => Some(root.join(custom)),
            None => discover_plist(root),
        }
    }

    /// The configured project file, or `ios/<App>.xcodeproj/project.pbxproj`.
    pub fn project_path(&self, root: &Path) -> Option<PathBuf> {
        match &self.project_override {
            Some(custom) => Some(root.join(custom)),
            None => discover_project(root),
        }
    }

    pub fn read(&self, root: &Path) -> Result<Option<IosVersion>> {
        let Some(plist_path) = self.plist_path(root) else {
            return Ok(None);
        };
        let Some(content) = read_optional(&plist_path)? else {
            return Ok(None);
        };

        let (version_entry, build_entry) = required_entries(&content, &plist_path)?;
        let version_variable = variable_name(&version_entry.value);
        let build_variable = variable_name(&build_entry.value);

        let mut record = IosVersion {
            version: match version_variable {
                Some(_) => DEFAULT_VERSION.to_string(),
                None => version_entry.value,
            },
            build_number: match build_variable {
                Some(_) => DEFAULT_BUILD.to_string(),
                None => build_entry.value,
            },
            uses_variables: version_variable.is_some() || build_variable.is_some(),
            version_variable,
            build_variable,
            project_file: None,
        };

        if record.uses_variables {
            self.resolve_variables(root, &mut record)?;
        }

        debug!(
            path = %plist_path.display(),
            version = %record.version,
            build = %record.build_number,
            uses_variables = record.uses_variables,
            "read ios manifest"
        );
        Ok(Some(record))
    }

    fn resolve_variables(&self, root: &Path, record: &mut IosVersion) -> Result<()> {
        let project = self.project_path(root);
        let content = match &project {
            Some(path) => read_optional(path)?,
            None => None,
        };
        let (Some(project), Some(content)) = (project, content) else {
            warn!("plist references build settings but no Xcode project file was found");
            return Ok(());
        };

        if let Some(name) = &record.version_variable {
            match resolve_variable(&content, name)? {
                Some(value) => record.version = value,
                None => warn!(variable = %name, "build setting not found in project file"),
            }
        }
        if let Some(name) = &record.build_variable {
            match resolve_variable(&content, name)? {
                Some(value) => record.build_number = value,
                None => warn!(variable = %name, "build setting not found in project file"),
            }
        }
        record.project_file = Some(project);
        Ok(())
    }

    /// Writes the new version and build number.
    ///
    /// Literal plist values are replaced on their `<string>` line; indirected
    /// values are replaced in the project file instead, leaving the plist as is.
    pub fn write(&self, root: &Path, new_version: &str, new_build: Option<u64>) -> Result<()> {
        let plist_path = self
            .plist_path(root)
            .ok_or_else(|| BumpError::NotFound(root.join("ios").join("Info.plist")))?;
        let current = self
            .read(root)?
            .ok_or_else(|| BumpError::NotFound(plist_path.clone()))?;
        let new_build =
            new_build.unwrap_or_else(|| current.build_number_value().saturating_add(1));
        let new_build = new_build.to_string();

        let content = read_optional(&plist_path)?
            .ok_or_else(|| BumpError::NotFound(plist_path.clone()))?;
        let (version_entry, build_entry) = required_entries(&content, &plist_path)?;

        let mut plist_edits: Vec<(usize, &str)> = Vec::new();
        let mut project_edits: Vec<(&str, &str)> = Vec::new();
        match &current.version_variable {
            Some(name) => project_edits.push((name.as_str(), new_version)),
            None => plist_edits.push((version_entry.line, new_version)),
        }
        match &current.build_variable {
            Some(name) => project_edits.push((name.as_str(), new_build.as_str())),
            None => plist_edits.push((build_entry.line, new_build.as_str())),
        }

        if !project_edits.is_empty() {
            let project_path = self
                .project_path(root)
                .ok_or_else(|| BumpError::NotFound(root.join("ios").join("project.pbxproj")))?;
            let mut project = read_optional(&project_path)?
                .ok_or_else(|| BumpError::NotFound(project_path.clone()))?;
            for (name, value) in project_edits {
                project = rewrite_variable(&project, name, value)?
                    .ok_or_else(|| BumpError::field_not_found(name, &project_path))?;
            }
            fs::write(&project_path, project)?;
            debug!(path = %project_path.display(), "wrote xcode project settings");
        }

        if !plist_edits.is_empty() {
            let string_value = Regex::new(r"^(.*?<string>)(.*?)(</string>.*)$")?;
            let mut output = String::with_capacity(content.len() + 8);
            for (index, line) in content.split_inclusive('\n').enumerate() {
                match plist_edits.iter().find(|(edit_line, _)| *edit_line == index) {
                    Some((_, value)) => {
                        let (body, ending) = split_line_ending(line);
                        let replaced = string_value.replace(body, |caps: &Captures| {
                            format!("{}{}{}", &caps[1], value, &caps[3])
                        });
                        output.push_str(&replaced);
                        output.push_str(ending);
                    }
                    None => output.push_str(line),
                }
            }
            fs::write(&plist_path, output)?;
            debug!(path = %plist_path.display(), "wrote info plist");
        }

        Ok(())
    }
}

/// Finds the `<string>` values that follow the version and build keys.
pub(crate) fn locate_entries(content: &str) -> Result<PlistEntries> {
    let string_value = Regex::new(r"<string>(.*?)</string>")?;
    let version_key = format!("<key>{}</key>", VERSION_KEY);
    let build_key = format!("<key>{}</key>", BUILD_KEY);

    let lines: Vec<&str> = content.lines().collect();
    let mut entries = PlistEntries::default();

    for (index, line) in lines.iter().enumerate() {
        let slot = if line.contains(&version_key) {
            &mut entries.version
        } else if line.contains(&build_key) {
            &mut entries.build
        } else {
            continue;
        };
        if slot.is_some() {
            continue;
        }
        if let Some(next) = lines.get(index + 1) {
            if let Some(caps) = string_value.captures(next) {
                *slot = Some(PlistEntry {
                    line: index + 1,
                    value: caps[1].trim().to_string(),
                });
            }
        }
    }

    Ok(entries)
}

fn required_entries(content: &str, path: &Path) -> Result<(PlistEntry, PlistEntry)> {
    let entries = locate_entries(content)?;
    let version = entries
        .version
        .ok_or_else(|| BumpError::field_not_found(VERSION_KEY, path))?;
    let build = entries
        .build
        .ok_or_else(|| BumpError::field_not_found(BUILD_KEY, path))?;
    Ok((version, build))
}

/// Extracts `NAME` from `$(NAME)` or `${NAME}`.
fn variable_name(value: &str) -> Option<String> {
    let inner = value
        .strip_prefix("$(")
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')))?;
    let valid = !inner.is_empty() && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| inner.to_string())
}

/// Resolves a build setting's value; the first shape that matches wins.
pub(crate) fn resolve_variable(content: &str, name: &str) -> Result<Option<String>> {
    for shape in ValueShape::CHAIN {
        if let Some(caps) = shape.pattern(name)?.captures(content) {
            return Ok(Some(caps[2].to_string()));
        }
    }
    Ok(None)
}

/// Rewrites every assignment of a build setting.
///
/// Each line is tried with the quoted shape, then the semicolon shape. If no
/// line changed, a whole-file substitution is attempted. `None` means the
/// setting does not occur at all.
fn rewrite_variable(content: &str, name: &str, value: &str) -> Result<Option<String>> {
    let quoted = ValueShape::Quoted.pattern(name)?;
    let semicolon = ValueShape::Semicolon.pattern(name)?;

    let mut replaced = false;
    let mut output = String::with_capacity(content.len() + 8);
    for line in content.split_inclusive('\n') {
        if quoted.is_match(line) {
            let line = quoted.replace_all(line, |caps: &Captures| {
                format!("{}\"{}\"{}", &caps[1], value, &caps[3])
            });
            output.push_str(&line);
            replaced = true;
        } else if semicolon.is_match(line) {
            let line = semicolon.replace_all(line, |caps: &Captures| {
                format!("{}{}{}", &caps[1], value, &caps[3])
            });
            output.push_str(&line);
            replaced = true;
        } else {
            output.push_str(line);
        }
    }
    if replaced {
        return Ok(Some(output));
    }

    let global = Regex::new(&format!(r"(\b{}\s*=\s*)[^;\n]*", regex::escape(name)))?;
    if !global.is_match(content) {
        return Ok(None);
    }
    let output = global.replace_all(content, |caps: &Captures| format!("{}{}", &caps[1], value));
    Ok(Some(output.into_owned()))
}

fn sorted_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn dir_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn discover_plist(root: &Path) -> Option<PathBuf> {
    sorted_dirs(&root.join("ios"))
        .into_iter()
        .filter(|dir| {
            let name = dir_name(dir);
            !matches!(name, "Pods" | "build")
                && !name.ends_with(".xcodeproj")
                && !name.ends_with(".xcworkspace")
                && !name.ends_with("Tests")
        })
        .map(|dir| dir.join("Info.plist"))
        .find(|plist| plist.is_file())
}

fn discover_project(root: &Path) -> Option<PathBuf> {
    sorted_dirs(&root.join("ios"))
        .into_iter()
        .filter(|dir| {
            let name = dir_name(dir);
            name.ends_with(".xcodeproj") && name != "Pods.xcodeproj"
        })
        .map(|dir| dir.join("project.pbxproj"))
        .find(|project| project.is_file())
}
