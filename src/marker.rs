//! Version marker file access.
//!
//! The marker is a text file holding a single version string, read and
//! written as a whole on each access.

use std::fs;
use std::path::Path;

use crate::domain::Version;
use crate::error::Result;

/// Read and parse the version stored in the marker file
pub fn read_version(path: &Path) -> Result<Version> {
    let contents = fs::read_to_string(path)?;
    Version::parse(contents.trim())
}

/// Write a version to the marker file with a trailing newline
pub fn write_version(version: &Version, path: &Path) -> Result<()> {
    fs::write(path, format!("{}\n", version))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_version_trims_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        fs::write(&path, "1.2.3-SNAPSHOT\n").unwrap();

        let version = read_version(&path).unwrap();
        assert_eq!(version.to_string(), "1.2.3-SNAPSHOT");
    }

    #[test]
    fn test_read_version_without_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        fs::write(&path, "2.0.0").unwrap();

        assert_eq!(read_version(&path).unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_read_version_invalid_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        fs::write(&path, "not a version\n").unwrap();

        assert!(read_version(&path).is_err());
    }

    #[test]
    fn test_read_version_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_version(&dir.path().join("VERSION")).is_err());
    }

    #[test]
    fn test_write_appends_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        let version = Version::parse("1.0.0-SNAPSHOT").unwrap();

        write_version(&version, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1.0.0-SNAPSHOT\n");
        assert_eq!(read_version(&path).unwrap(), version);
    }
}
