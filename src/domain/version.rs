//! Structured semantic version and the release/next-development transitions.
//!
//! The `-SNAPSHOT` marker, when present, is always the last prerelease
//! segment and signals an in-development version.

use std::fmt;
use std::str::FromStr;

use crate::error::{ReleaseError, Result};

/// The prerelease segment marking an in-development version
pub const SNAPSHOT: &str = "SNAPSHOT";

/// Semantic version with `-`-separated prerelease segments.
///
/// Parsed once through a strict parser; the transition algorithms operate
/// on the structured fields and formatting is a plain serialization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<String>,
}

impl Version {
    /// Parse a version string (e.g. "1.2.3", "1.2.3-BETA1-SNAPSHOT").
    ///
    /// Validation is delegated to the `semver` grammar; the prerelease is
    /// then re-segmented on `-`. Build metadata is rejected because the
    /// marker file round-trip would silently drop it.
    pub fn parse(input: &str) -> Result<Self> {
        let parsed = semver::Version::parse(input).map_err(|_| ReleaseError::version(input))?;

        if !parsed.build.is_empty() {
            return Err(ReleaseError::version(input));
        }

        let prerelease = if parsed.pre.is_empty() {
            Vec::new()
        } else {
            parsed.pre.as_str().split('-').map(String::from).collect()
        };

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }

    /// Whether the last prerelease segment is the snapshot marker
    pub fn is_snapshot(&self) -> bool {
        self.prerelease.last().map(String::as_str) == Some(SNAPSHOT)
    }

    /// The release form of this version: the trailing `SNAPSHOT` segment is
    /// dropped if present, everything else is kept unchanged.
    pub fn release(&self) -> Version {
        let mut version = self.clone();
        if version.is_snapshot() {
            version.prerelease.pop();
        }
        version
    }

    /// The next in-development version.
    ///
    /// Bumps the lowest-granularity identifier that exists: a prerelease
    /// ending in a digit run gets its counter incremented (`BETA1` ->
    /// `BETA2`, bare `1` -> `2`); otherwise the patch field is incremented
    /// and the prerelease dropped. The `SNAPSHOT` segment is appended in
    /// either case.
    ///
    /// A prerelease counter that cannot be incremented without overflowing
    /// falls back to the patch bump; a patch field at the numeric maximum
    /// fails with `UnsupportedVersionFormat`.
    pub fn next_development(&self) -> Result<Version> {
        let base = self.release();

        let mut next = Version {
            major: base.major,
            minor: base.minor,
            patch: base.patch,
            prerelease: Vec::new(),
        };

        match bump_trailing_number(&base.prerelease.join("-")) {
            Some(bumped) => {
                next.prerelease = bumped.split('-').map(String::from).collect();
            }
            None => {
                next.patch = next
                    .patch
                    .checked_add(1)
                    .ok_or_else(|| ReleaseError::version(self.to_string()))?;
            }
        }

        next.prerelease.push(SNAPSHOT.to_string());
        Ok(next)
    }
}

/// Increment the trailing digit run of a prerelease identifier.
///
/// Returns `None` when there is no trailing digit run, or when the part
/// before it is not a plain alphabetic (optionally `-`-joined) prefix.
fn bump_trailing_number(prerelease: &str) -> Option<String> {
    let digit_count = prerelease
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .count();

    if digit_count == 0 {
        return None;
    }

    let (prefix, digits) = prerelease.split_at(prerelease.len() - digit_count);

    if !prefix.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
        return None;
    }

    let number: u64 = digits.parse().ok()?;
    let bumped = number.checked_add(1)?;

    Some(format!("{}{}", prefix, bumped))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for segment in &self.prerelease {
            write!(f, "-{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

// Serialized as the formatted string so outcome records stay readable.
impl serde::Serialize for Version {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
