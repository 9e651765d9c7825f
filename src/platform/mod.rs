//! Manifest readers and writers, one per platform.
//!
//! Callers never touch a platform module directly: [`Manifest`] is a tagged
//! union over the three implementations and exposes the same small capability
//! set (`read`, `write`, `path`) for each of them.

pub mod android;
pub mod ios;
pub mod package;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;

pub use android::{AndroidManifest, AndroidVersion};
pub use ios::{IosManifest, IosVersion};
pub use package::{PackageManifest, PackageVersion};

/// A release target whose manifest carries a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Platform {
    Package,
    Android,
    Ios,
}

impl Platform {
    /// All platforms in plan order.
    pub const ALL: [Platform; 3] = [Platform::Package, Platform::Android, Platform::Ios];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Package => "Package",
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }

    /// Whether the configuration turns this platform off.
    pub fn is_skipped(&self, config: &Config) -> bool {
        match self {
            Platform::Package => config.platforms.skip_package,
            Platform::Android => config.platforms.skip_android,
            Platform::Ios => config.platforms.skip_ios,
        }
    }

    /// Whether the platform carries a build counter next to its version.
    pub fn has_build_number(&self) -> bool {
        !matches!(self, Platform::Package)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Currently observed version state of one platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformVersion {
    Package(PackageVersion),
    Android(AndroidVersion),
    Ios(IosVersion),
}

impl PlatformVersion {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformVersion::Package(_) => Platform::Package,
            PlatformVersion::Android(_) => Platform::Android,
            PlatformVersion::Ios(_) => Platform::Ios,
        }
    }

    /// The semantic version string.
    pub fn version(&self) -> &str {
        match self {
            PlatformVersion::Package(p) => &p.version,
            PlatformVersion::Android(a) => &a.version_name,
            PlatformVersion::Ios(i) => &i.version,
        }
    }

    /// The build counter, if the platform has one.
    pub fn build_number(&self) -> Option<u64> {
        match self {
            PlatformVersion::Package(_) => None,
            PlatformVersion::Android(a) => Some(a.version_code),
            PlatformVersion::Ios(i) => Some(i.build_number_value()),
        }
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_version(self.version(), self.build_number()))
    }
}

/// Formats a version for humans: `1.2.3` or `1.2.3 (45)`.
pub fn display_version(version: &str, build: Option<u64>) -> String {
    match build {
        Some(build) => format!("{} ({})", version, build),
        None => version.to_string(),
    }
}

/// Reader/writer capability for one platform's manifest.
#[derive(Debug, Clone)]
pub enum Manifest {
    Package(PackageManifest),
    Android(AndroidManifest),
    Ios(IosManifest),
}

impl Manifest {
    /// Builds the manifest handle for a platform, honouring path overrides.
    pub fn for_platform(platform: Platform, config: &Config) -> Self {
        match platform {
            Platform::Package => Manifest::Package(PackageManifest::new()),
            Platform::Android => Manifest::Android(AndroidManifest::new(
                config.paths.android_build_gradle.clone(),
            )),
            Platform::Ios => Manifest::Ios(IosManifest::new(
                config.paths.ios_info_plist.clone(),
                config.paths.ios_project_file.clone(),
            )),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Manifest::Package(_) => Platform::Package,
            Manifest::Android(_) => Platform::Android,
            Manifest::Ios(_) => Platform::Ios,
        }
    }

    /// Location of the primary manifest file, if it can be determined.
    pub fn path(&self, root: &Path) -> Option<PathBuf> {
        match self {
            Manifest::Package(m) => Some(m.path(root)),
            Manifest::Android(m) => Some(m.path(root)),
            Manifest::Ios(m) => m.plist_path(root),
        }
    }

    /// Reads the current version.
    ///
    /// # Returns
    /// * `Ok(Some(_))` - The manifest was found and parsed
    /// * `Ok(None)` - The manifest file does not exist
    /// * `Err` - The file exists but the expected fields could not be located
    pub fn read(&self, root: &Path) -> Result<Option<PlatformVersion>> {
        Ok(match self {
            Manifest::Package(m) => m.read(root)?.map(PlatformVersion::Package),
            Manifest::Android(m) => m.read(root)?.map(PlatformVersion::Android),
            Manifest::Ios(m) => m.read(root)?.map(PlatformVersion::Ios),
        })
    }

    /// Writes a new version (and build number, where the platform has one).
    ///
    /// Without `new_build` the platform's counter is advanced by one.
    pub fn write(&self, root: &Path, new_version: &str, new_build: Option<u64>) -> Result<()> {
        match self {
            Manifest::Package(m) => m.write(root, new_version),
            Manifest::Android(m) => m.write(root, new_version, new_build),
            Manifest::Ios(m) => m.write(root, new_version, new_build),
        }
    }
}

/// Reads a file, mapping "does not exist" to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
