use crate::error::{GitPromoteError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Release version used for ordering tags and release branches.
///
/// Only `(major, minor, patch)` takes part in equality and ordering; any
/// pre-release or build suffix lives on the tag text, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a declared application version (e.g. "1.2.3", "v1.2.3-beta.1").
    ///
    /// Pre-release and build metadata are accepted and dropped.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let clean = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let parsed = semver::Version::parse(clean).map_err(|e| {
            GitPromoteError::validation(format!(
                "'{}' is not a valid version, expected {{major}}.{{minor}}.{{patch}}: {}",
                input, e
            ))
        })?;

        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Strictly newer than `other`
    pub fn is_newer_than(&self, other: &Version) -> bool {
        is_newer_than(self, other)
    }

    /// Newer than or equal to `other`
    pub fn is_newer_or_equal(&self, other: &Version) -> bool {
        is_newer_or_equal(self, other)
    }
}

/// Compare two versions by major, then minor, then patch.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then_with(|| a.minor.cmp(&b.minor))
        .then_with(|| a.patch.cmp(&b.patch))
}

pub fn is_newer_than(a: &Version, b: &Version) -> bool {
    compare(a, b) == Ordering::Greater
}

pub fn is_newer_or_equal(a: &Version, b: &Version) -> bool {
    compare(a, b) != Ordering::Less
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
