use thiserror::Error;

/// Unified error type for the release workflow.
///
/// Every variant is terminal for the current invocation: nothing is retried
/// internally. Failures raised before the first repository mutation are safe
/// to re-run once the operator fixes the underlying condition; failures
/// during the mutation phase leave the repository in an intermediate state
/// that requires manual inspection.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Working tree is not clean")]
    DirtyWorkingTree,

    #[error("Existing release branch(es) ({}) found", .0.join(", "))]
    ConflictingReleaseBranch(Vec<String>),

    #[error("No release branches found")]
    NoReleaseBranch,

    #[error("More than one release branch ({}) found", .0.join(", "))]
    MultipleReleaseBranches(Vec<String>),

    #[error("{0} branch is not up to date")]
    BranchNotUpToDate(String),

    #[error("Unsupported version {0}")]
    UnsupportedVersionFormat(String),

    #[error("`{command}` terminated with a non-zero exit code")]
    CommandFailed { command: String, stderr: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in the release workflow
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version format error naming the offending input
    pub fn version(input: impl Into<String>) -> Self {
        ReleaseError::UnsupportedVersionFormat(input.into())
    }

    /// Diagnostic output captured from a failed command, if any.
    ///
    /// Surfaced in debug mode; the normal error message only names the
    /// command that failed.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ReleaseError::CommandFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
