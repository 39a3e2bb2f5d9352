use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReleaseError, Result};

/// Workflow configuration, immutable for the duration of one invocation.
///
/// `trunk_branch: None` means "skip the trunk entirely and tag directly off
/// the release branch"; `remote: None` means local-only operation (no fetch,
/// no push, no remote branch checks).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkflowConfig {
    #[serde(default = "default_development_branch")]
    pub development_branch: String,

    #[serde(default = "default_trunk_branch")]
    pub trunk_branch: Option<String>,

    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,

    #[serde(default)]
    pub remote: Option<String>,
}

fn default_development_branch() -> String {
    "develop".to_string()
}

fn default_trunk_branch() -> Option<String> {
    Some("master".to_string())
}

fn default_version_file() -> PathBuf {
    PathBuf::from("VERSION")
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            development_branch: default_development_branch(),
            trunk_branch: default_trunk_branch(),
            version_file: default_version_file(),
            remote: None,
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Lookup order:
/// 1. Custom path provided as parameter
/// 2. `gitrelease.toml` in the current directory
/// 3. `.gitrelease.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// A file that exists but cannot be read or parsed is an error; a missing
/// file is not.
pub fn load_config(config_path: Option<&str>) -> Result<WorkflowConfig> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./gitrelease.toml").exists() {
        fs::read_to_string("./gitrelease.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".gitrelease.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(WorkflowConfig::default());
        }
    } else {
        return Ok(WorkflowConfig::default());
    };

    toml::from_str(&config_str).map_err(|e| ReleaseError::config(e.to_string()))
}
