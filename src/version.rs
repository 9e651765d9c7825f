use std::str::FromStr;

/// Represents a semantic version with major, minor, and patch components.
///
/// Never stored on its own: manifests hold version strings, which are parsed
/// on every read and formatted back on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Represents the type of semantic version bump to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl Version {
    /// Creates a new Version with the specified major, minor, and patch components.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parses a version string without ever failing.
    ///
    /// Only the first three dot-separated segments are considered. Each one is
    /// reduced to its leading ASCII digits; a segment that is absent, empty or
    /// non-numeric counts as 0.
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(Version::parse_lenient("1.2"), Version::new(1, 2, 0));
    /// assert_eq!(Version::parse_lenient("abc"), Version::new(0, 0, 0));
    /// assert_eq!(Version::parse_lenient("2.0.3-beta.1"), Version::new(2, 0, 3));
    /// ```
    pub fn parse_lenient(version: &str) -> Self {
        let mut parts = version.trim().split('.').map(leading_number);
        let major = parts.next().unwrap_or(0);
        let minor = parts.next().unwrap_or(0);
        let patch = parts.next().unwrap_or(0);
        Version::new(major, minor, patch)
    }
}

fn leading_number(segment: &str) -> u32 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().unwrap_or(0)
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::fmt::Display for VersionBump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VersionBump::Major => "major",
            VersionBump::Minor => "minor",
            VersionBump::Patch => "patch",
        };
        f.write_str(name)
    }
}

impl FromStr for VersionBump {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(VersionBump::Major),
            "minor" => Ok(VersionBump::Minor),
            "patch" => Ok(VersionBump::Patch),
            other => Err(format!(
                "unknown bump type '{}' (expected major, minor or patch)",
                other
            )),
        }
    }
}

/// Parses a version from a git tag string.
///
/// Removes a leading 'v' or 'V' and expects exactly three numeric components.
///
/// # Returns
/// * `Some(Version)` - Successfully parsed version
/// * `None` - If tag doesn't match the pattern or has wrong number of components
pub fn parse_version_from_tag(tag: &str) -> Option<Version> {
    let clean_tag = tag.trim_start_matches('v').trim_start_matches('V');

    let parts: Vec<&str> = clean_tag.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let major = parts[0].parse::<u32>().ok()?;
    let minor = parts[1].parse::<u32>().ok()?;
    let patch = parts[2].parse::<u32>().ok()?;

    Some(Version::new(major, minor, patch))
}

/// Bumps a version according to the specified bump type.
///
/// Increments the appropriate version component and resets lower components to 0:
/// - **Major**: major += 1, minor = 0, patch = 0
/// - **Minor**: minor += 1, patch = 0
/// - **Patch**: patch += 1
pub fn bump_version(mut version: Version, bump_type: &VersionBump) -> Version {
    match bump_type {
        VersionBump::Major => {
            version.major = version.major.saturating_add(1);
            version.minor = 0;
            version.patch = 0;
        }
        VersionBump::Minor => {
            version.minor = version.minor.saturating_add(1);
            version.patch = 0;
        }
        VersionBump::Patch => {
            version.patch = version.patch.saturating_add(1);
        }
    }
    version
}

/// Bumps a version string, always producing exactly three components.
///
/// `bump("1.2", VersionBump::Minor)` is `"1.3.0"`; malformed input degrades to
/// zeros rather than failing.
pub fn bump(version: &str, kind: VersionBump) -> String {
    bump_version(Version::parse_lenient(version), &kind).to_string()
}

/// Picks the greatest version by (major, minor, patch).
///
/// The original string of the winner is returned; on ties the first one seen wins.
pub fn highest_version(versions: &[String]) -> Option<String> {
    let mut best: Option<(&String, Version)> = None;
    for candidate in versions {
        let parsed = Version::parse_lenient(candidate);
        match best {
            Some((_, current)) if parsed <= current => {}
            _ => best = Some((candidate, parsed)),
        }
    }
    best.map(|(s, _)| s.clone())
}

/// Checks that user input is a plain `major.minor.patch` release version.
pub fn is_release_version(input: &str) -> bool {
    match semver::Version::parse(input.trim()) {
        Ok(v) => v.pre.is_empty() && v.build.is_empty(),
        Err(_) => false,
    }
}
