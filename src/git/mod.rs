//! Git operations abstraction layer
//!
//! The release workflow only talks to the repository through the [GitOps]
//! trait. Two implementations exist:
//!
//! - [cli::GitCli]: the real implementation, shelling out to the `git`
//!   binary one blocking invocation at a time
//! - [mock::MockGit]: a recording test double with scripted repository state
//!
//! Every operation either succeeds or fails with a single
//! [crate::error::ReleaseError::CommandFailed]-style terminal error; there
//! is no internal retry. Repository state is never cached by callers: each
//! check re-queries the collaborator right before acting on it.

pub mod cli;
pub mod mock;

pub use cli::GitCli;
pub use mock::MockGit;

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;

use crate::error::Result;

/// Version-control operations consumed by the release workflow.
///
/// The workflow is single-threaded and synchronous, so implementations are
/// free to use interior mutability and need no thread-safety bounds.
pub trait GitOps {
    /// Whether the working tree has no uncommitted changes and no untracked
    /// files (after the standard ignore rules are applied)
    fn is_working_tree_clean(&self) -> Result<bool>;

    /// Fetch the given remote
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Push a branch or tag ref to the remote
    fn push(&self, remote: &str, refname: &str) -> Result<()>;

    /// Check out an existing branch, tag, or other ref
    fn checkout(&self, refname: &str) -> Result<()>;

    /// Create a new branch at HEAD and check it out
    fn checkout_new_branch(&self, branch: &str) -> Result<()>;

    /// Branch names matching `pattern`, searching local branches and, when a
    /// remote is given, its remote-tracking branches as well
    fn branches_matching(&self, pattern: &Regex, remote: Option<&str>)
        -> Result<BTreeSet<String>>;

    /// True iff zero commits exist on the remote counterpart of `branch`
    /// that are absent locally
    fn is_branch_up_to_date(&self, branch: &str, remote: &str) -> Result<bool>;

    /// Stage the given files and commit them; a no-op when nothing ends up
    /// staged
    fn commit(&self, files: &[&Path], message: &str) -> Result<()>;

    /// Merge a branch into the current one. With a remote, the
    /// remote-tracking ref of the branch is merged instead of the local one.
    fn merge(&self, branch: &str, message: &str, remote: Option<&str>) -> Result<()>;

    /// Create an annotated tag at HEAD
    fn tag(&self, name: &str, message: &str) -> Result<()>;

    /// Delete a local branch, and its remote counterpart when a remote is
    /// given
    fn delete_branch(&self, branch: &str, remote: Option<&str>) -> Result<()>;

    /// The configured user display name, if any
    fn current_user_name(&self) -> Result<Option<String>>;
}
