use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::debug;

use crate::error::{BumpError, Result};

use super::read_optional;

const DEFAULT_BUILD_GRADLE: &str = "android/app/build.gradle";

/// Version state of the Android build descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct AndroidVersion {
    pub version_name: String,
    pub version_code: u64,
}

/// Reader/writer for `build.gradle`.
#[derive(Debug, Clone, Default)]
pub struct AndroidManifest {
    custom_path: Option<PathBuf>,
}

/// Where the version fields sit inside `defaultConfig`.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct DefaultConfigFields {
    pub version_code: Option<(usize, u64)>,
    pub version_name: Option<(usize, String)>,
}

struct Patterns {
    version_code: Regex,
    version_name: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Patterns {
            version_code: Regex::new(r"^(\s*versionCode\s*=?\s*)(\d+)")?,
            version_name: Regex::new(r#"^(\s*versionName\s*=?\s*)(["'])([^"']*)(["'])"#)?,
        })
    }
}

impl AndroidManifest {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        AndroidManifest { custom_path }
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        match &self.custom_path {
            Some(custom) => root.join(custom),
            None => root.join(DEFAULT_BUILD_GRADLE),
        }
    }

    pub fn read(&self, root: &Path) -> Result<Option<AndroidVersion>> {
        let path = self.path(root);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };

        let fields = locate_fields(&content)?;
        let (_, version_code) = fields
            .version_code
            .ok_or_else(|| BumpError::field_not_found("versionCode", &path))?;
        let (_, version_name) = fields
            .version_name
            .ok_or_else(|| BumpError::field_not_found("versionName", &path))?;

        debug!(path = %path.display(), %version_name, version_code, "read android manifest");
        Ok(Some(AndroidVersion {
            version_name,
            version_code,
        }))
    }

    /// Rewrites `versionName` and `versionCode` in place.
    ///
    /// The code becomes `new_build`, or the current code plus one.
    pub fn write(&self, root: &Path, new_version: &str, new_build: Option<u64>) -> Result<()> {
        let path = self.path(root);
        let content = read_optional(&path)?.ok_or_else(|| BumpError::NotFound(path.clone()))?;

        let patterns = Patterns::new()?;
        let fields = scan(&content, &patterns);
        let (code_line, old_code) = fields
            .version_code
            .ok_or_else(|| BumpError::field_not_found("versionCode", &path))?;
        let (name_line, _) = fields
            .version_name
            .ok_or_else(|| BumpError::field_not_found("versionName", &path))?;
        let new_code = new_build.unwrap_or_else(|| old_code.saturating_add(1));

        let mut output = String::with_capacity(content.len() + 8);
        for (index, line) in content.split_inclusive('\n').enumerate() {
            let (body, ending) = split_line_ending(line);
            if index == code_line {
                let replaced = patterns
                    .version_code
                    .replace(body, |caps: &Captures| format!("{}{}", &caps[1], new_code));
                output.push_str(&replaced);
                output.push_str(ending);
            } else if index == name_line {
                let replaced = patterns.version_name.replace(body, |caps: &Captures| {
                    format!("{}{}{}{}", &caps[1], &caps[2], new_version, &caps[4])
                });
                output.push_str(&replaced);
                output.push_str(ending);
            } else {
                output.push_str(line);
            }
        }

        fs::write(&path, output)?;
        debug!(
            path = %path.display(),
            version = new_version,
            version_code = new_code,
            "wrote android manifest"
        );
        Ok(())
    }
}

/// Finds the first `versionCode` and `versionName` inside `defaultConfig`.
///
/// Block tracking is shallow: the block starts at a line beginning with
/// `defaultConfig` that opens a brace, and ends at the first line that is just
/// `}`, so the closing brace of a nested block also ends it.
pub(crate) fn locate_fields(content: &str) -> Result<DefaultConfigFields> {
    let patterns = Patterns::new()?;
    Ok(scan(content, &patterns))
}

fn scan(content: &str, patterns: &Patterns) -> DefaultConfigFields {
    let mut fields = DefaultConfigFields::default();
    let mut in_default_config = false;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let (body, _) = split_line_ending(line);
        let trimmed = body.trim();

        if !in_default_config {
            if trimmed.starts_with("defaultConfig") && trimmed.contains('{') {
                in_default_config = true;
            }
            continue;
        }

        if trimmed == "}" {
            in_default_config = false;
            continue;
        }

        if fields.version_code.is_none() && trimmed.starts_with("versionCode") {
            if let Some(caps) = patterns.version_code.captures(body) {
                if let Ok(code) = caps[2].parse::<u64>() {
                    fields.version_code = Some((index, code));
                }
            }
        } else if fields.version_name.is_none() && trimmed.starts_with("versionName") {
            if let Some(caps) = patterns.version_name.captures(body) {
                fields.version_name = Some((index, caps[3].to_string()));
            }
        }

        if fields.version_code.is_some() && fields.version_name.is_some() {
            break;
        }
    }

    fields
}

pub(crate) fn split_line_ending(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\r', '\n']);
    (body, &line[body.len()..])
}
