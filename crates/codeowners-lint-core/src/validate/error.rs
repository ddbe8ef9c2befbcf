//! Error types for check execution and check construction.

use crate::validate::github_client::GithubClientError;
use std::io;
use thiserror::Error;

/// An internal failure of a single check.
///
/// Unlike an [`Issue`](crate::validate::Issue), this means the check could
/// not finish. The runner isolates it to the failing check and reports it
/// separately from content issues.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The run was interrupted.
    #[error("check was cancelled")]
    Cancelled,

    /// A pattern could not be compiled into a glob.
    #[error("invalid glob for pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A pattern could not be compiled into a regular expression.
    #[error("invalid regex for pattern {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Walking the repository failed.
    #[error("failed to walk repository: {0}")]
    Walk(#[from] ignore::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A git subprocess exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    /// The working tree has uncommitted changes.
    #[error(
        "git state is dirty: commit all changes before executing the not-owned check:\n{status}"
    )]
    DirtyWorkTree { status: String },

    /// A remote lookup failed and could not be reported as an issue.
    #[error("remote lookup failed: {0}")]
    Remote(#[from] GithubClientError),

    /// The check task panicked or was aborted.
    #[error("check task aborted: {0}")]
    Aborted(String),
}

impl CheckError {
    /// Returns true if this error only reflects cancellation of the run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CheckError::Cancelled)
    }
}

/// A configuration problem detected while building checks.
///
/// Raised before any check runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid repository {0:?}: expected 'owner/repo'")]
    InvalidRepository(String),

    #[error("missing required configuration: {0}")]
    MissingRequired(String),

    #[error("unknown check '{0}'")]
    UnknownCheck(String),

    #[error("invalid severity override '{0}': expected 'check=level'")]
    InvalidSeverityOverride(String),
}
