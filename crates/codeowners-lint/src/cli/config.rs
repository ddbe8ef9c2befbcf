//! Configuration handling for the CLI.
//!
//! This module converts CLI arguments into the library's configuration types
//! and handles GitHub authentication setup. Everything here fails fast: a
//! bad option stops the process before any check runs.

use crate::cli::{Args, FailureLevel};
use codeowners_lint_core::validate::checks::parse_severity_overrides;
use codeowners_lint_core::{CheckConfig, CheckName, Severity, find_codeowners_file};
use jsonwebtoken::EncodingKey;
use octocrab::Octocrab;
use octocrab::models::{AppId, InstallationId};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use thiserror::Error;

/// The public GitHub API, used when no base URL is configured.
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com/";

/// Errors that can occur during configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required configuration.
    #[error("missing required configuration: {0}")]
    MissingRequired(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// GitHub authentication error.
    #[error("GitHub authentication error: {0}")]
    GitHubAuth(String),

    /// Failed to read CODEOWNERS file.
    #[error("failed to read CODEOWNERS file: {0}")]
    ReadCodeowners(String),

    /// The checks could not be built from the configuration.
    #[error(transparent)]
    Check(#[from] codeowners_lint_core::ConfigError),
}

/// Application exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Validation passed successfully.
    Success = 0,
    /// Application startup failed (wrong configuration or internal error).
    StartupFailure = 1,
    /// Application terminated by signal (SIGINT/SIGTERM).
    Terminated = 2,
    /// Validation failed (checks found issues).
    ValidationFailed = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<FailureLevel> for Severity {
    fn from(level: FailureLevel) -> Self {
        match level {
            FailureLevel::Warning => Severity::Warning,
            FailureLevel::Error => Severity::Error,
        }
    }
}

/// How to authenticate against GitHub.
pub enum GithubAuth {
    Token(SecretString),
    App {
        app_id: u64,
        installation_id: u64,
        private_key: SecretString,
    },
}

impl std::fmt::Debug for GithubAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GithubAuth::Token(_) => f.write_str("Token(..)"),
            GithubAuth::App {
                app_id,
                installation_id,
                ..
            } => f
                .debug_struct("App")
                .field("app_id", app_id)
                .field("installation_id", installation_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Connection settings for the GitHub API.
#[derive(Debug)]
pub struct GithubSettings {
    pub base_url: String,
    pub upload_url: Option<String>,
    pub auth: GithubAuth,
}

impl GithubSettings {
    /// Picks exactly one authentication method from the arguments.
    fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.github_access_token.is_some() && args.github_app_id.is_some() {
            return Err(ConfigError::Invalid(
                "GITHUB_ACCESS_TOKEN and GITHUB_APP_ID are mutually exclusive".to_string(),
            ));
        }

        let auth = match (
            args.github_app_id,
            args.github_app_installation_id,
            &args.github_app_private_key,
        ) {
            (Some(app_id), Some(installation_id), Some(private_key)) => GithubAuth::App {
                app_id,
                installation_id,
                private_key: SecretString::from(private_key.clone()),
            },
            (Some(_), _, _) => {
                return Err(ConfigError::MissingRequired(
                    "GITHUB_APP_INSTALLATION_ID and GITHUB_APP_PRIVATE_KEY are required with GITHUB_APP_ID"
                        .to_string(),
                ));
            }
            (None, _, _) => match args.github_access_token {
                Some(ref token) => GithubAuth::Token(SecretString::from(token.clone())),
                None => {
                    return Err(ConfigError::MissingRequired(
                        "GITHUB_ACCESS_TOKEN or GitHub App credentials are required when 'owners' check is enabled"
                            .to_string(),
                    ));
                }
            },
        };

        Ok(Self {
            base_url: args.github_base_url.clone(),
            upload_url: args.github_upload_url.clone(),
            auth,
        })
    }
}

/// Validated and processed configuration for running the linter.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Path to the repository root.
    pub repo_path: PathBuf,
    /// Path to the CODEOWNERS file.
    pub codeowners_path: PathBuf,
    /// Per-check options.
    pub check_config: CheckConfig,
    /// Checks to run, in order.
    pub checks: Vec<CheckName>,
    /// The least severe issue that fails the run.
    pub threshold: Severity,
    /// Whether to output JSON.
    pub json_output: bool,
    /// Present only when the owners check is selected.
    pub github: Option<GithubSettings>,
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let repo_path = args.repository_path.canonicalize().map_err(|e| {
            ConfigError::Invalid(format!(
                "repository path '{}' is invalid: {}",
                args.repository_path.display(),
                e
            ))
        })?;

        let codeowners_path = find_codeowners_file(&repo_path).ok_or_else(|| {
            ConfigError::ReadCodeowners(format!(
                "CODEOWNERS file not found in repository '{}'. Searched in: .github/CODEOWNERS, CODEOWNERS, docs/CODEOWNERS",
                repo_path.display()
            ))
        })?;

        let checks = args.selected_checks();
        let owners_enabled = checks.contains(&CheckName::Owners);
        if owners_enabled && args.owner_checker_repository.is_none() {
            return Err(ConfigError::MissingRequired(
                "OWNER_CHECKER_REPOSITORY is required when 'owners' check is enabled".to_string(),
            ));
        }

        let github = if owners_enabled {
            Some(GithubSettings::from_args(args)?)
        } else {
            None
        };

        let mut check_config = CheckConfig::new()
            .with_owners_must_be_teams(args.owner_checker_owners_must_be_teams)
            .with_allow_unowned_patterns(args.owner_checker_allow_unowned_patterns)
            .with_trust_workspace(args.not_owned_checker_trust_workspace);

        if let Some(ref ignored) = args.owner_checker_ignored_owners {
            check_config = check_config.with_ignored_owners(
                ignored
                    .iter()
                    .map(|owner| owner.trim().to_string())
                    .filter(|owner| !owner.is_empty())
                    .collect(),
            );
        }

        if let Some(ref patterns) = args.not_owned_checker_skip_patterns {
            check_config = check_config.with_skip_patterns(patterns.clone());
        }

        if let Some(ref paths) = args.not_owned_checker_subdirectories {
            check_config = check_config.with_subdirectories(paths.clone());
        }

        if let Some(ref repo) = args.owner_checker_repository {
            check_config = check_config.with_repository(repo.clone());
        }

        if let Some(ref overrides) = args.severity_overrides {
            for (check, severity) in parse_severity_overrides(overrides)? {
                check_config = check_config.with_severity_override(check, severity);
            }
        }

        Ok(Self {
            repo_path,
            codeowners_path,
            check_config,
            checks,
            threshold: args.check_failure_level.into(),
            json_output: args.json,
            github,
        })
    }
}

/// Creates an Octocrab client from the GitHub settings.
pub async fn create_octocrab(settings: &GithubSettings) -> Result<Octocrab, ConfigError> {
    let mut builder = Octocrab::builder();
    if settings.base_url != DEFAULT_GITHUB_BASE_URL {
        builder = builder
            .base_uri(settings.base_url.as_str())
            .map_err(|e| ConfigError::GitHubAuth(format!("invalid base URL: {}", e)))?;
    }
    if let Some(ref upload_url) = settings.upload_url {
        builder = builder
            .upload_uri(upload_url.as_str())
            .map_err(|e| ConfigError::GitHubAuth(format!("invalid upload URL: {}", e)))?;
    }

    match &settings.auth {
        GithubAuth::Token(token) => builder
            .personal_token(token.expose_secret().to_string())
            .build()
            .map_err(|e| ConfigError::GitHubAuth(format!("failed to build client: {}", e))),
        GithubAuth::App {
            app_id,
            installation_id,
            private_key,
        } => {
            let key = EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes())
                .map_err(|e| ConfigError::GitHubAuth(format!("invalid private key: {}", e)))?;

            let app_client = builder
                .app(AppId(*app_id), key)
                .build()
                .map_err(|e| {
                    ConfigError::GitHubAuth(format!("failed to create app client: {}", e))
                })?;

            app_client
                .installation(InstallationId(*installation_id))
                .map_err(|e| {
                    ConfigError::GitHubAuth(format!("failed to get installation client: {}", e))
                })
        }
    }
}
