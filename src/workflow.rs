//! Release workflow orchestration.
//!
//! `start` and `finish` are fixed step sequences: every precondition runs
//! before the first repository mutation, every step returns a `Result`, and
//! the sequence short-circuits on the first failure. There is no rollback
//! and no retry: a mutation-phase failure leaves the repository in an
//! intermediate state that requires manual inspection before re-running.

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::config::WorkflowConfig;
use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use crate::git::GitOps;
use crate::marker;

/// Pattern every release branch name matches
pub const RELEASE_BRANCH_PATTERN: &str = r"^release/.*";

/// Result of a successful `start`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartOutcome {
    pub release_version: Version,
    pub release_branch: String,
    pub next_dev_version: Version,
}

/// Result of a successful `finish`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishOutcome {
    pub release_version: Version,
    pub tag: String,
}

fn release_branch_pattern() -> Result<Regex> {
    Regex::new(RELEASE_BRANCH_PATTERN).map_err(|e| ReleaseError::config(e.to_string()))
}

/// Start a release: cut `release/<version>` off the development branch and
/// move the development line to the next snapshot version.
///
/// With no explicit version, the release version is derived from the
/// current marker value by stripping its `SNAPSHOT` segment.
pub fn start(
    git: &dyn GitOps,
    config: &WorkflowConfig,
    explicit_version: Option<Version>,
) -> Result<StartOutcome> {
    if !git.is_working_tree_clean()? {
        return Err(ReleaseError::DirtyWorkingTree);
    }

    let remote = config.remote.as_deref();

    if let Some(remote) = remote {
        git.fetch(remote)?;
    }

    let pattern = release_branch_pattern()?;
    let existing = git.branches_matching(&pattern, remote)?;
    if !existing.is_empty() {
        return Err(ReleaseError::ConflictingReleaseBranch(
            existing.into_iter().collect(),
        ));
    }

    // Begin mutation

    git.checkout(&config.development_branch)?;

    if let Some(remote) = remote {
        if !git.is_branch_up_to_date(&config.development_branch, remote)? {
            return Err(ReleaseError::BranchNotUpToDate(
                config.development_branch.clone(),
            ));
        }
    }

    let release_version = match explicit_version {
        Some(version) => version,
        None => marker::read_version(&config.version_file)?.release(),
    };

    let next_dev_version = release_version.next_development()?;
    let release_branch = format!("release/{}", release_version);

    info!(
        release = %release_version,
        next_dev = %next_dev_version,
        branch = %release_branch,
        "starting release"
    );

    marker::write_version(&next_dev_version, &config.version_file)?;
    git.commit(
        &[config.version_file.as_path()],
        &format!("Start {}", next_dev_version),
    )?;

    if let Some(remote) = remote {
        git.push(remote, &config.development_branch)?;
    }

    git.checkout_new_branch(&release_branch)?;

    marker::write_version(&release_version, &config.version_file)?;
    git.commit(
        &[config.version_file.as_path()],
        &format!("Release start {}", release_version),
    )?;

    if let Some(remote) = remote {
        git.push(remote, &release_branch)?;
    }

    Ok(StartOutcome {
        release_version,
        release_branch,
        next_dev_version,
    })
}

/// Finish the release: merge the single `release/*` branch into the trunk
/// (or tag it directly when no trunk is configured), create the annotated
/// release tag, restore the development version, and delete the release
/// branch. The working tree ends up on the release tag.
pub fn finish(git: &dyn GitOps, config: &WorkflowConfig) -> Result<FinishOutcome> {
    if !git.is_working_tree_clean()? {
        return Err(ReleaseError::DirtyWorkingTree);
    }

    let remote = config.remote.as_deref();
    let trunk = config.trunk_branch.as_deref();

    if let Some(remote) = remote {
        git.fetch(remote)?;
    }

    let pattern = release_branch_pattern()?;
    let matches = git.branches_matching(&pattern, remote)?;

    if matches.len() > 1 {
        return Err(ReleaseError::MultipleReleaseBranches(
            matches.into_iter().collect(),
        ));
    }
    let release_branch = match matches.into_iter().next() {
        Some(branch) => branch,
        None => return Err(ReleaseError::NoReleaseBranch),
    };

    let user_name = git.current_user_name()?;

    // Begin mutation

    if let Some(remote) = remote {
        let mut branches = vec![config.development_branch.as_str()];
        branches.extend(trunk);
        branches.push(&release_branch);

        for branch in branches {
            git.checkout(branch)?;
            if !git.is_branch_up_to_date(branch, remote)? {
                return Err(ReleaseError::BranchNotUpToDate(branch.to_string()));
            }
        }
    }

    match trunk {
        Some(trunk) => {
            git.checkout(trunk)?;
            git.merge(&release_branch, &format!("Merge {}", release_branch), remote)?;
            if let Some(remote) = remote {
                git.push(remote, trunk)?;
            }
        }
        // Without a trunk, the release branch itself is tagged
        None => git.checkout(&release_branch)?,
    }

    let release_version = marker::read_version(&config.version_file)?;

    let release_message = match user_name {
        Some(user) => format!("Release {} by {}", release_version, user),
        None => format!("Release {}", release_version),
    };

    let tag = release_version.to_string();
    git.tag(&tag, &release_message)?;

    if let Some(remote) = remote {
        git.push(remote, &tag)?;
    }

    git.checkout(&config.development_branch)?;

    // The development line keeps its own version: capture it before the
    // merge and restore it afterwards.
    let current_version = marker::read_version(&config.version_file)?;

    let merge_source = trunk.unwrap_or(&release_branch);
    git.merge(merge_source, &format!("Merge {}", merge_source), remote)?;

    marker::write_version(&current_version, &config.version_file)?;
    git.commit(
        &[config.version_file.as_path()],
        &format!("Restore the current version {}", current_version),
    )?;

    if let Some(remote) = remote {
        git.push(remote, &config.development_branch)?;
    }

    git.delete_branch(&release_branch, remote)?;

    git.checkout(&tag)?;

    info!(release = %release_version, tag = %tag, "finished release");

    Ok(FinishOutcome {
        release_version,
        tag,
    })
}
