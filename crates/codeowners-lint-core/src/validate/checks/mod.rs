//! The check contract and the built-in checks.
//!
//! Every check implements [`Check`]: it receives the shared, read-only
//! [`CheckInput`] plus the run's [`CancellationToken`] and returns either the
//! issues it found or a [`CheckError`] when it could not finish.

mod duppatterns;
mod files;
mod notowned;
mod owners;
mod registry;
mod shadowing;
mod syntax;

pub use duppatterns::DupPatternsCheck;
pub use files::FilesCheck;
pub use notowned::NotOwnedCheck;
pub use owners::OwnersCheck;
pub use registry::{CheckName, SeverityOverride, build_checks, parse_severity_overrides};
pub use shadowing::AvoidShadowingCheck;
pub use syntax::SyntaxCheck;

use crate::parse::Entry;
use crate::validate::syntax::GHOST_OWNER;
use crate::validate::{CancellationToken, CheckError, CheckOutput, Severity};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration options for validation checks.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Owners that should be skipped during validation.
    pub ignored_owners: HashSet<String>,
    /// If true, only team owners (@org/team) are allowed, not individual users.
    pub owners_must_be_teams: bool,
    /// If true, patterns without owners are allowed.
    pub allow_unowned_patterns: bool,
    /// Patterns to skip when checking for unowned files.
    pub skip_patterns: Vec<String>,
    /// Paths the not-owned check is restricted to. Empty means the whole tree.
    pub subdirectories: Vec<String>,
    /// If true, git is told to trust the repository directory.
    pub trust_workspace: bool,
    /// The repository in "owner/repo" format, used for owner validation.
    pub repository: Option<String>,
    /// Severity forced onto every issue of the named checks.
    pub severity_overrides: HashMap<CheckName, Severity>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            ignored_owners: HashSet::from([GHOST_OWNER.to_string()]),
            owners_must_be_teams: false,
            allow_unowned_patterns: true,
            skip_patterns: Vec::new(),
            subdirectories: Vec::new(),
            trust_workspace: false,
            repository: None,
            severity_overrides: HashMap::new(),
        }
    }
}

impl CheckConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ignored owners.
    pub fn with_ignored_owners(mut self, owners: HashSet<String>) -> Self {
        self.ignored_owners = owners;
        self
    }

    /// Sets whether owners must be teams.
    pub fn with_owners_must_be_teams(mut self, value: bool) -> Self {
        self.owners_must_be_teams = value;
        self
    }

    /// Sets whether unowned patterns are allowed.
    pub fn with_allow_unowned_patterns(mut self, value: bool) -> Self {
        self.allow_unowned_patterns = value;
        self
    }

    /// Sets the patterns to skip for the not-owned check.
    pub fn with_skip_patterns(mut self, patterns: Vec<String>) -> Self {
        self.skip_patterns = patterns;
        self
    }

    /// Restricts the not-owned check to the given paths.
    pub fn with_subdirectories(mut self, paths: Vec<String>) -> Self {
        self.subdirectories = paths;
        self
    }

    pub fn with_trust_workspace(mut self, value: bool) -> Self {
        self.trust_workspace = value;
        self
    }

    /// Sets the repository for owner validation.
    pub fn with_repository(mut self, repo: impl Into<String>) -> Self {
        self.repository = Some(repo.into());
        self
    }

    /// Forces every issue of `check` to the given severity.
    pub fn with_severity_override(mut self, check: CheckName, severity: Severity) -> Self {
        self.severity_overrides.insert(check, severity);
        self
    }
}

/// The input shared by every check of a run.
///
/// Cloning is cheap: entries sit behind an `Arc` and are never mutated.
#[derive(Debug, Clone)]
pub struct CheckInput {
    /// Absolute path to the repository root.
    pub repo_dir: PathBuf,
    /// Entries in file order.
    pub entries: Arc<[Entry]>,
}

impl CheckInput {
    pub fn new(repo_dir: impl Into<PathBuf>, entries: impl Into<Arc<[Entry]>>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            entries: entries.into(),
        }
    }
}

/// A validation check.
#[async_trait]
pub trait Check: Send + Sync {
    /// Returns the stable name of this check, as used for selection.
    fn name(&self) -> &'static str;

    /// Runs the check.
    ///
    /// Implementations check `cancel` before every unit of work and return
    /// `CheckError::Cancelled` without partial issues once it fires.
    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError>;
}
