//! Real [GitOps] implementation shelling out to the `git` binary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use tracing::debug;

use crate::error::{ReleaseError, Result};
use crate::git::GitOps;

/// Runs `git` subcommands as blocking child processes.
///
/// Each call maps to exactly one invocation (or a short fixed sequence of
/// them); a non-zero exit code becomes
/// [ReleaseError::CommandFailed] carrying the attempted command line and the
/// captured standard error.
pub struct GitCli {
    workdir: Option<PathBuf>,
}

impl GitCli {
    /// Operate on the repository in the current working directory
    pub fn new() -> Self {
        GitCli { workdir: None }
    }

    /// Operate on the repository at the given path
    pub fn with_workdir(path: impl Into<PathBuf>) -> Self {
        GitCli {
            workdir: Some(path.into()),
        }
    }

    /// Run a git subcommand and return its stdout lines
    fn run(&self, args: &[&str]) -> Result<Vec<String>> {
        let command_line = format!("git {}", args.join(" "));
        debug!("Executing `{}`", command_line);

        let mut command = Command::new("git");
        command.args(args);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        let output = command.output()?;
        let stderr = String::from_utf8_lossy(&output.stderr)
            .trim_end_matches('\n')
            .to_string();

        if !output.status.success() {
            for line in stderr.lines() {
                debug!("STDERR: {}", line);
            }
            return Err(ReleaseError::CommandFailed {
                command: command_line,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end_matches('\n')
            .lines()
            .map(String::from)
            .collect())
    }

    fn staged_files(&self) -> Result<Vec<String>> {
        self.run(&["diff", "--name-only", "--cached"])
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for GitCli {
    fn is_working_tree_clean(&self) -> Result<bool> {
        // diff-index exits non-zero when tracked files have changes
        match self.run(&["diff-index", "--quiet", "HEAD"]) {
            Ok(_) => {}
            Err(ReleaseError::CommandFailed { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }

        let untracked = self.run(&["ls-files", "--exclude-standard", "--others"])?;
        for file in &untracked {
            debug!("Untracked file: {}", file);
        }

        Ok(untracked.is_empty())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", remote])?;
        Ok(())
    }

    fn push(&self, remote: &str, refname: &str) -> Result<()> {
        self.run(&["push", remote, refname])?;
        Ok(())
    }

    fn checkout(&self, refname: &str) -> Result<()> {
        self.run(&["checkout", refname])?;
        Ok(())
    }

    fn checkout_new_branch(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch])?;
        Ok(())
    }

    fn branches_matching(
        &self,
        pattern: &Regex,
        remote: Option<&str>,
    ) -> Result<BTreeSet<String>> {
        let mut result = BTreeSet::new();

        let lines = self.run(&["for-each-ref", "--format=%(refname)", "refs/heads"])?;
        for line in lines {
            if let Some(branch) = line.strip_prefix("refs/heads/") {
                if pattern.is_match(branch) {
                    result.insert(branch.to_string());
                }
            }
        }

        if let Some(remote) = remote {
            let prefix = format!("refs/remotes/{}/", remote);
            let refs = format!("refs/remotes/{}", remote);
            let lines = self.run(&["for-each-ref", "--format=%(refname)", &refs])?;
            for line in lines {
                if let Some(branch) = line.strip_prefix(&prefix) {
                    if pattern.is_match(branch) {
                        result.insert(branch.to_string());
                    }
                }
            }
        }

        Ok(result)
    }

    fn is_branch_up_to_date(&self, branch: &str, remote: &str) -> Result<bool> {
        let range = format!("{}..{}/{}", branch, remote, branch);
        let command_line = format!("git rev-list {} --count", range);
        let lines = self.run(&["rev-list", &range, "--count"])?;

        let first = lines.first().ok_or_else(|| ReleaseError::CommandFailed {
            command: command_line.clone(),
            stderr: "no output".to_string(),
        })?;

        let behind: u64 = first
            .trim()
            .parse()
            .map_err(|_| ReleaseError::CommandFailed {
                command: command_line,
                stderr: format!("non-numeric result {}", first),
            })?;

        Ok(behind == 0)
    }

    fn commit(&self, files: &[&Path], message: &str) -> Result<()> {
        let mut args = vec!["add".to_string()];
        args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args)?;

        if !self.staged_files()?.is_empty() {
            self.run(&["commit", "-m", message])?;
        }

        Ok(())
    }

    fn merge(&self, branch: &str, message: &str, remote: Option<&str>) -> Result<()> {
        let merge_ref = match remote {
            Some(remote) => format!("{}/{}", remote, branch),
            None => branch.to_string(),
        };
        self.run(&["merge", "-m", message, &merge_ref])?;
        Ok(())
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        self.run(&["tag", "-a", name, "-m", message])?;
        Ok(())
    }

    fn delete_branch(&self, branch: &str, remote: Option<&str>) -> Result<()> {
        if let Some(remote) = remote {
            self.run(&["push", remote, "--delete", branch])?;
        }
        self.run(&["branch", "-d", branch])?;
        Ok(())
    }

    fn current_user_name(&self) -> Result<Option<String>> {
        match self.run(&["config", "user.name"]) {
            Ok(lines) => Ok(lines.into_iter().next().filter(|name| !name.is_empty())),
            Err(ReleaseError::CommandFailed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
