use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{BumpError, Result};

use super::read_optional;

const DEFAULT_VERSION: &str = "0.0.0";

/// Version state of `package.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageVersion {
    pub version: String,
}

/// Reader/writer for the package manifest.
#[derive(Debug, Clone, Default)]
pub struct PackageManifest;

impl PackageManifest {
    pub fn new() -> Self {
        PackageManifest
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        root.join("package.json")
    }

    pub fn read(&self, root: &Path) -> Result<Option<PackageVersion>> {
        let path = self.path(root);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };

        let document = parse_document(&path, &content)?;
        let version = document
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_VERSION)
            .to_string();

        debug!(path = %path.display(), %version, "read package manifest");
        Ok(Some(PackageVersion { version }))
    }

    /// Sets the top-level `version` and re-serializes with two-space indentation
    /// and a trailing newline. Key order is preserved.
    pub fn write(&self, root: &Path, new_version: &str) -> Result<()> {
        let path = self.path(root);
        let content = read_optional(&path)?.ok_or_else(|| BumpError::NotFound(path.clone()))?;

        let mut document = parse_document(&path, &content)?;
        if let Value::Object(map) = &mut document {
            map.insert("version".to_string(), Value::String(new_version.to_string()));
        }

        let mut output = serde_json::to_string_pretty(&document)
            .map_err(|e| BumpError::parse(&path, e.to_string()))?;
        output.push('\n');
        fs::write(&path, output)?;

        debug!(path = %path.display(), version = new_version, "wrote package manifest");
        Ok(())
    }
}

fn parse_document(path: &Path, content: &str) -> Result<Value> {
    let document: Value =
        serde_json::from_str(content).map_err(|e| BumpError::parse(path, e.to_string()))?;
    if !document.is_object() {
        return Err(BumpError::parse(path, "top-level value is not an object"));
    }
    Ok(document)
}
