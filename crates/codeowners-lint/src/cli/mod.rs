//! Command-line argument parsing.
//!
//! Every option can also be supplied through the environment, which is how
//! the tool is usually configured in CI.

pub mod config;
pub mod github;
pub mod output;

use clap::{ArgAction, Parser, ValueEnum};
use codeowners_lint_core::CheckName;
use std::path::PathBuf;

/// CODEOWNERS file linter - validates GitHub CODEOWNERS files.
///
/// Ensures the correctness of your CODEOWNERS file by running various
/// checks against it. Supports both human-readable and JSON output formats.
#[derive(Parser, Debug)]
#[command(name = "codeowners-lint")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the repository root.
    #[arg(long, env = "REPOSITORY_PATH", default_value = ".")]
    pub repository_path: PathBuf,

    /// GitHub personal access token for owner validation.
    #[arg(long, env = "GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    pub github_access_token: Option<String>,

    /// GitHub base URL for API requests (for GitHub Enterprise).
    #[arg(long, env = "GITHUB_BASE_URL", default_value = "https://api.github.com/")]
    pub github_base_url: String,

    /// GitHub upload URL (defaults to base URL if not specified).
    #[arg(long, env = "GITHUB_UPLOAD_URL")]
    pub github_upload_url: Option<String>,

    /// GitHub App ID for authentication (alternative to access token).
    #[arg(long, env = "GITHUB_APP_ID")]
    pub github_app_id: Option<u64>,

    /// GitHub App Installation ID (required when using App authentication).
    #[arg(long, env = "GITHUB_APP_INSTALLATION_ID")]
    pub github_app_installation_id: Option<u64>,

    /// GitHub App private key in PEM format (required when using App authentication).
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY", hide_env_values = true)]
    pub github_app_private_key: Option<String>,

    /// Comma-separated list of checks to run.
    /// Possible values: files, owners, duppatterns, syntax
    #[arg(long, env = "CHECKS", value_delimiter = ',')]
    pub checks: Option<Vec<CheckKind>>,

    /// Comma-separated list of experimental checks to run.
    /// Possible values: notowned, avoid-shadowing
    #[arg(long, env = "EXPERIMENTAL_CHECKS", value_delimiter = ',')]
    pub experimental_checks: Option<Vec<ExperimentalCheckKind>>,

    /// Failure level for validation issues.
    /// 'warning' treats both errors and warnings as failures.
    /// 'error' only treats errors as failures.
    #[arg(long, env = "CHECK_FAILURE_LEVEL", default_value = "warning")]
    pub check_failure_level: FailureLevel,

    /// Repository in 'owner/repo' format for owner validation.
    #[arg(long, env = "OWNER_CHECKER_REPOSITORY")]
    pub owner_checker_repository: Option<String>,

    /// Comma-separated list of owners to ignore during validation.
    #[arg(long, env = "OWNER_CHECKER_IGNORED_OWNERS", value_delimiter = ',')]
    pub owner_checker_ignored_owners: Option<Vec<String>>,

    /// Allow patterns without owners in the CODEOWNERS file.
    #[arg(
        long,
        env = "OWNER_CHECKER_ALLOW_UNOWNED_PATTERNS",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub owner_checker_allow_unowned_patterns: bool,

    /// Require all owners to be teams (@org/team), not individual users.
    #[arg(
        long,
        env = "OWNER_CHECKER_OWNERS_MUST_BE_TEAMS",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub owner_checker_owners_must_be_teams: bool,

    /// Comma-separated patterns of files the not-owned checker never reports.
    #[arg(long, env = "NOT_OWNED_CHECKER_SKIP_PATTERNS", value_delimiter = ',')]
    pub not_owned_checker_skip_patterns: Option<Vec<String>>,

    /// Comma-separated paths the not-owned checker is restricted to.
    #[arg(long, env = "NOT_OWNED_CHECKER_SUBDIRECTORIES", value_delimiter = ',')]
    pub not_owned_checker_subdirectories: Option<Vec<String>>,

    /// Mark the repository as a git safe.directory for the not-owned checker.
    #[arg(
        long,
        env = "NOT_OWNED_CHECKER_TRUST_WORKSPACE",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub not_owned_checker_trust_workspace: bool,

    /// Comma-separated 'check=level' pairs that re-tag every issue of a check,
    /// e.g. 'files=warning'.
    #[arg(long, env = "SEVERITY_OVERRIDES")]
    pub severity_overrides: Option<String>,

    /// Output validation results as JSON instead of human-readable format.
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Increase verbosity level (-v for info, -vv for debug, -vvv for trace).
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Standard validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum CheckKind {
    /// Check that patterns match existing files.
    Files,
    /// Check that owners exist on GitHub.
    Owners,
    /// Check for duplicate patterns.
    Duppatterns,
    /// Check for syntax errors.
    Syntax,
}

impl CheckKind {
    /// Returns all standard checks.
    pub fn all() -> Vec<Self> {
        vec![Self::Files, Self::Owners, Self::Duppatterns, Self::Syntax]
    }
}

impl From<CheckKind> for CheckName {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Files => CheckName::Files,
            CheckKind::Owners => CheckName::Owners,
            CheckKind::Duppatterns => CheckName::Duppatterns,
            CheckKind::Syntax => CheckName::Syntax,
        }
    }
}

/// Experimental validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ExperimentalCheckKind {
    /// Check for files not covered by any CODEOWNERS rule.
    Notowned,
    /// Check for patterns that shadow earlier patterns.
    AvoidShadowing,
}

impl From<ExperimentalCheckKind> for CheckName {
    fn from(kind: ExperimentalCheckKind) -> Self {
        match kind {
            ExperimentalCheckKind::Notowned => CheckName::Notowned,
            ExperimentalCheckKind::AvoidShadowing => CheckName::AvoidShadowing,
        }
    }
}

/// Failure level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FailureLevel {
    /// Treat both warnings and errors as failures (exit code 3).
    #[default]
    Warning,
    /// Only treat errors as failures.
    Error,
}

impl Args {
    /// Returns every check to run: the standard selection (all by default)
    /// followed by the requested experimental checks.
    pub fn selected_checks(&self) -> Vec<CheckName> {
        let standard = self.checks.clone().unwrap_or_else(CheckKind::all);
        let experimental = self.experimental_checks.clone().unwrap_or_default();

        let mut names: Vec<CheckName> = Vec::new();
        for name in standard
            .into_iter()
            .map(CheckName::from)
            .chain(experimental.into_iter().map(CheckName::from))
        {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
