//! Recording [GitOps] test double with scripted repository state.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Result;
use crate::git::GitOps;

/// A commit recorded by [MockGit], with the on-disk contents of the
/// committed files captured at commit time.
///
/// The content snapshot is what makes per-branch marker assertions
/// possible: the double does not simulate branch file states, but it knows
/// which branch was checked out when each commit happened.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub branch: String,
    pub message: String,
    pub files: Vec<(PathBuf, Option<String>)>,
}

#[derive(Default)]
struct MockState {
    clean: bool,
    local_branches: BTreeSet<String>,
    remote_branches: BTreeSet<String>,
    behind_remote: BTreeSet<String>,
    user_name: Option<String>,
    current_branch: String,
    commits: Vec<CommitRecord>,
    checkout_files: BTreeMap<String, Vec<(PathBuf, String)>>,
}

/// Mock repository for testing the workflow without git.
///
/// State is scripted up front through the setters; every trait call is
/// appended to a log so tests can assert exactly which operations ran and
/// in which order.
pub struct MockGit {
    state: RefCell<MockState>,
    calls: RefCell<Vec<String>>,
}

impl MockGit {
    /// Create a mock with a clean working tree and no branches
    pub fn new() -> Self {
        MockGit {
            state: RefCell::new(MockState {
                clean: true,
                ..MockState::default()
            }),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_clean(&self, clean: bool) {
        self.state.borrow_mut().clean = clean;
    }

    pub fn add_local_branch(&self, branch: impl Into<String>) {
        self.state.borrow_mut().local_branches.insert(branch.into());
    }

    pub fn add_remote_branch(&self, branch: impl Into<String>) {
        self.state.borrow_mut().remote_branches.insert(branch.into());
    }

    /// Mark a branch as having commits on its remote counterpart that are
    /// absent locally
    pub fn set_behind_remote(&self, branch: impl Into<String>) {
        self.state.borrow_mut().behind_remote.insert(branch.into());
    }

    pub fn set_user_name(&self, name: impl Into<String>) {
        self.state.borrow_mut().user_name = Some(name.into());
    }

    /// Script a file to be written to disk whenever `refname` is checked
    /// out, simulating per-branch working tree contents
    pub fn script_checkout_file(
        &self,
        refname: impl Into<String>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) {
        self.state
            .borrow_mut()
            .checkout_files
            .entry(refname.into())
            .or_default()
            .push((path.into(), content.into()));
    }

    /// The ref most recently checked out
    pub fn current_branch(&self) -> String {
        self.state.borrow().current_branch.clone()
    }

    pub fn local_branches(&self) -> BTreeSet<String> {
        self.state.borrow().local_branches.clone()
    }

    /// Every trait call, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// The subset of calls that mutate the repository or working tree
    pub fn mutations(&self) -> Vec<String> {
        const MUTATING: &[&str] = &[
            "checkout ",
            "checkout_new_branch ",
            "commit ",
            "merge ",
            "tag ",
            "push ",
            "delete_branch ",
        ];
        self.calls
            .borrow()
            .iter()
            .filter(|call| MUTATING.iter().any(|prefix| call.starts_with(prefix)))
            .cloned()
            .collect()
    }

    /// All recorded commits with their file-content snapshots
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.state.borrow().commits.clone()
    }

    /// Commits made while the given branch was checked out
    pub fn commits_on(&self, branch: &str) -> Vec<CommitRecord> {
        self.state
            .borrow()
            .commits
            .iter()
            .filter(|c| c.branch == branch)
            .cloned()
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for MockGit {
    fn is_working_tree_clean(&self) -> Result<bool> {
        self.record("is_working_tree_clean".to_string());
        Ok(self.state.borrow().clean)
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.record(format!("fetch {}", remote));
        Ok(())
    }

    fn push(&self, remote: &str, refname: &str) -> Result<()> {
        self.record(format!("push {} {}", remote, refname));
        Ok(())
    }

    fn checkout(&self, refname: &str) -> Result<()> {
        self.record(format!("checkout {}", refname));
        let mut state = self.state.borrow_mut();
        state.current_branch = refname.to_string();
        if let Some(files) = state.checkout_files.get(refname) {
            for (path, content) in files {
                fs::write(path, content)?;
            }
        }
        Ok(())
    }

    fn checkout_new_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout_new_branch {}", branch));
        let mut state = self.state.borrow_mut();
        state.local_branches.insert(branch.to_string());
        state.current_branch = branch.to_string();
        Ok(())
    }

    fn branches_matching(
        &self,
        pattern: &Regex,
        remote: Option<&str>,
    ) -> Result<BTreeSet<String>> {
        self.record(format!(
            "branches_matching {} {}",
            pattern.as_str(),
            remote.unwrap_or("-")
        ));
        let state = self.state.borrow();

        let mut result: BTreeSet<String> = state
            .local_branches
            .iter()
            .filter(|b| pattern.is_match(b))
            .cloned()
            .collect();

        if remote.is_some() {
            result.extend(
                state
                    .remote_branches
                    .iter()
                    .filter(|b| pattern.is_match(b))
                    .cloned(),
            );
        }

        Ok(result)
    }

    fn is_branch_up_to_date(&self, branch: &str, remote: &str) -> Result<bool> {
        self.record(format!("is_branch_up_to_date {} {}", branch, remote));
        Ok(!self.state.borrow().behind_remote.contains(branch))
    }

    fn commit(&self, files: &[&Path], message: &str) -> Result<()> {
        self.record(format!("commit {}", message));
        let snapshot: Vec<(PathBuf, Option<String>)> = files
            .iter()
            .map(|path| (path.to_path_buf(), fs::read_to_string(path).ok()))
            .collect();

        let mut state = self.state.borrow_mut();
        let branch = state.current_branch.clone();
        state.commits.push(CommitRecord {
            branch,
            message: message.to_string(),
            files: snapshot,
        });
        Ok(())
    }

    fn merge(&self, branch: &str, message: &str, remote: Option<&str>) -> Result<()> {
        self.record(format!(
            "merge {} \"{}\" {}",
            branch,
            message,
            remote.unwrap_or("-")
        ));
        Ok(())
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        self.record(format!("tag {} \"{}\"", name, message));
        Ok(())
    }

    fn delete_branch(&self, branch: &str, remote: Option<&str>) -> Result<()> {
        self.record(format!("delete_branch {} {}", branch, remote.unwrap_or("-")));
        self.state.borrow_mut().local_branches.remove(branch);
        Ok(())
    }

    fn current_user_name(&self) -> Result<Option<String>> {
        self.record("current_user_name".to_string());
        Ok(self.state.borrow().user_name.clone())
    }
}
