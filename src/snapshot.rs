use std::path::Path;

use tracing::{debug, warn};

use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::platform::{
    AndroidVersion, IosVersion, Manifest, PackageVersion, Platform, PlatformVersion,
};

/// A manifest that exists but could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableManifest {
    pub platform: Platform,
    pub reason: String,
}

/// Current versions of every enabled platform that could be read.
///
/// Platforms without a manifest are absent. A manifest that exists but cannot
/// be read is absent too, and listed in `unreadable` so the run can report it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionSnapshot {
    pub package: Option<PackageVersion>,
    pub android: Option<AndroidVersion>,
    pub ios: Option<IosVersion>,
    pub unreadable: Vec<UnreadableManifest>,
}

impl VersionSnapshot {
    pub fn get(&self, platform: Platform) -> Option<PlatformVersion> {
        match platform {
            Platform::Package => self.package.clone().map(PlatformVersion::Package),
            Platform::Android => self.android.clone().map(PlatformVersion::Android),
            Platform::Ios => self.ios.clone().map(PlatformVersion::Ios),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.package.is_none() && self.android.is_none() && self.ios.is_none()
    }

    /// True when no manifest was found at all, readable or not.
    pub fn has_no_manifests(&self) -> bool {
        self.is_empty() && self.unreadable.is_empty()
    }

    /// Why the platform's manifest could not be read, if it could not.
    pub fn unreadable_reason(&self, platform: Platform) -> Option<&str> {
        self.unreadable
            .iter()
            .find(|entry| entry.platform == platform)
            .map(|entry| entry.reason.as_str())
    }

    /// Present platforms in plan order.
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|platform| self.get(*platform).is_some())
            .collect()
    }

    /// Present records in plan order.
    pub fn records(&self) -> Vec<PlatformVersion> {
        Platform::ALL
            .into_iter()
            .filter_map(|platform| self.get(platform))
            .collect()
    }

    /// Semantic version strings of the present platforms, in plan order.
    pub fn semantic_versions(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|record| record.version().to_string())
            .collect()
    }

    fn set(&mut self, record: PlatformVersion) {
        match record {
            PlatformVersion::Package(p) => self.package = Some(p),
            PlatformVersion::Android(a) => self.android = Some(a),
            PlatformVersion::Ios(i) => self.ios = Some(i),
        }
    }
}

/// Reads every enabled platform independently.
///
/// Never fails: a missing manifest leaves the platform absent, and a manifest
/// that cannot be read is logged and recorded in `unreadable`.
pub fn current_versions(root: &Path, config: &Config) -> VersionSnapshot {
    collect(root, config).0
}

/// Like [`current_versions`], also returning a warning per unreadable manifest.
pub fn collect(root: &Path, config: &Config) -> (VersionSnapshot, Vec<BoundaryWarning>) {
    let mut snapshot = VersionSnapshot::default();
    let mut warnings = Vec::new();

    for platform in Platform::ALL {
        if platform.is_skipped(config) {
            debug!(%platform, "platform disabled in configuration");
            continue;
        }

        match Manifest::for_platform(platform, config).read(root) {
            Ok(Some(record)) => snapshot.set(record),
            Ok(None) => debug!(%platform, "manifest not found"),
            Err(e) => {
                warn!(%platform, error = %e, "could not read manifest");
                let reason = e.to_string();
                warnings.push(BoundaryWarning::ManifestUnreadable {
                    platform,
                    reason: reason.clone(),
                });
                snapshot
                    .unreadable
                    .push(UnreadableManifest { platform, reason });
            }
        }
    }

    if snapshot.has_no_manifests() {
        warnings.push(BoundaryWarning::NoManifestsFound {
            root: root.display().to_string(),
        });
    }

    (snapshot, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn android_only() -> TempDir {
        let dir = TempDir::new().unwrap();
        let gradle = dir.path().join("android/app/build.gradle");
        fs::create_dir_all(gradle.parent().unwrap()).unwrap();
        fs::write(
            gradle,
            "android {\n    defaultConfig {\n        versionCode 5\n        versionName \"2.0.0\"\n    }\n}\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_partial_snapshot() {
        let dir = android_only();
        let snapshot = current_versions(dir.path(), &Config::default());

        assert!(snapshot.package.is_none());
        assert!(snapshot.ios.is_none());
        assert_eq!(snapshot.android.as_ref().unwrap().version_code, 5);
        assert_eq!(snapshot.platforms(), vec![Platform::Android]);
        assert_eq!(snapshot.semantic_versions(), vec!["2.0.0".to_string()]);
    }

    #[test]
    fn test_unreadable_manifest_is_recorded() {
        let dir = android_only();
        fs::write(dir.path().join("package.json"), "{ broken").unwrap();

        let (snapshot, warnings) = collect(dir.path(), &Config::default());
        assert!(snapshot.package.is_none());
        assert!(snapshot.android.is_some());
        assert!(snapshot.unreadable_reason(Platform::Package).is_some());
        assert!(snapshot.unreadable_reason(Platform::Android).is_none());
        assert!(!snapshot.has_no_manifests());
        assert!(matches!(
            warnings.as_slice(),
            [BoundaryWarning::ManifestUnreadable {
                platform: Platform::Package,
                ..
            }]
        ));
    }

    #[test]
    fn test_empty_root_warns() {
        let dir = TempDir::new().unwrap();
        let (snapshot, warnings) = collect(dir.path(), &Config::default());
        assert!(snapshot.has_no_manifests());
        assert!(matches!(
            warnings.as_slice(),
            [BoundaryWarning::NoManifestsFound { .. }]
        ));
    }

    #[test]
    fn test_skipped_platform_is_not_read() {
        let dir = android_only();
        let mut config = Config::default();
        config.platforms.skip_android = true;

        assert!(current_versions(dir.path(), &config).is_empty());
    }

    #[test]
    fn test_only_unreadable_manifest_is_not_empty_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "[1, 2]").unwrap();

        let (snapshot, warnings) = collect(dir.path(), &Config::default());
        assert!(snapshot.is_empty());
        assert!(!snapshot.has_no_manifests());
        assert_eq!(warnings.len(), 1);
    }
}
