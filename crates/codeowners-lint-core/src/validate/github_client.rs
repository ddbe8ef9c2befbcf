//! GitHub client trait abstraction for owner validation.
//!
//! The owners check only talks to GitHub through [`GithubClient`], so the
//! CLI can plug in octocrab while tests use in-memory fakes.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// The result of checking if a user exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserExistsResult {
    /// The user exists.
    Exists,
    /// The user was not found.
    NotFound,
    /// Insufficient authorization to check the user.
    Unauthorized,
}

/// The effective permission a team has on a repository.
///
/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RepoPermission {
    Pull,
    Triage,
    Push,
    Maintain,
    Admin,
}

impl RepoPermission {
    /// Returns true if the permission allows approving pull requests.
    pub fn can_write(&self) -> bool {
        *self >= RepoPermission::Push
    }

    /// Picks the highest permission from GitHub's boolean permission map.
    pub fn from_flags(
        admin: bool,
        maintain: bool,
        push: bool,
        triage: bool,
        pull: bool,
    ) -> Option<Self> {
        if admin {
            Some(RepoPermission::Admin)
        } else if maintain {
            Some(RepoPermission::Maintain)
        } else if push {
            Some(RepoPermission::Push)
        } else if triage {
            Some(RepoPermission::Triage)
        } else if pull {
            Some(RepoPermission::Pull)
        } else {
            None
        }
    }
}

impl fmt::Display for RepoPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepoPermission::Pull => "pull",
            RepoPermission::Triage => "triage",
            RepoPermission::Push => "push",
            RepoPermission::Maintain => "maintain",
            RepoPermission::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when interacting with the GitHub client.
#[derive(Debug, Clone, Error)]
pub enum GithubClientError {
    /// GitHub answered with an error status for this particular request.
    #[error("GitHub API error: {0}")]
    ApiError(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Authentication failed.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl GithubClientError {
    /// Returns true if retrying other owners cannot succeed either.
    ///
    /// Only a per-request API error leaves the client usable.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, GithubClientError::ApiError(_))
    }

    /// Returns true for failures caused by the environment (credentials or
    /// quota) rather than by the CODEOWNERS content.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            GithubClientError::AuthError(_) | GithubClientError::RateLimitExceeded
        )
    }
}

/// Trait for GitHub API client implementations.
///
/// Listing methods must follow pagination and return every item.
///
/// # Example
///
/// ```rust,ignore
/// use codeowners_lint_core::validate::github_client::*;
///
/// struct MyGithubClient { /* ... */ }
///
/// #[async_trait::async_trait]
/// impl GithubClient for MyGithubClient {
///     async fn user_exists(&self, username: &str) -> Result<UserExistsResult, GithubClientError> {
///         Ok(UserExistsResult::Exists)
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait GithubClient: Send + Sync {
    /// Checks if a GitHub user exists.
    ///
    /// `username` is given without the leading '@'.
    async fn user_exists(&self, username: &str) -> Result<UserExistsResult, GithubClientError>;

    /// Lists the logins of every member of an organization.
    async fn list_org_members(&self, org: &str) -> Result<Vec<String>, GithubClientError>;

    /// Lists the logins of every outside collaborator of an organization.
    async fn list_outside_collaborators(&self, org: &str)
    -> Result<Vec<String>, GithubClientError>;

    /// Lists the slugs of every team in an organization.
    async fn list_org_teams(&self, org: &str) -> Result<Vec<String>, GithubClientError>;

    /// Returns the permission `team` has on `owner/repo`, including
    /// permission inherited from parent teams.
    ///
    /// `Ok(None)` means the team has no access to the repository.
    async fn team_repo_permission(
        &self,
        org: &str,
        team: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Option<RepoPermission>, GithubClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = GithubClientError::ApiError("422 Unprocessable Entity: bad".to_string());
        assert_eq!(err.to_string(), "GitHub API error: 422 Unprocessable Entity: bad");
        assert_eq!(
            GithubClientError::RateLimitExceeded.to_string(),
            "Rate limit exceeded"
        );
    }

    #[test]
    fn permission_display() {
        assert_eq!(RepoPermission::Triage.to_string(), "triage");
        assert_eq!(RepoPermission::Admin.to_string(), "admin");
    }

    #[test]
    fn permanence() {
        assert!(!GithubClientError::ApiError("422".into()).is_permanent());
        assert!(GithubClientError::RateLimitExceeded.is_permanent());
        assert!(GithubClientError::AuthError("bad token".into()).is_permanent());
        assert!(GithubClientError::NetworkError("reset".into()).is_permanent());
        assert!(GithubClientError::Other("?".into()).is_permanent());
    }

    #[test]
    fn environmental() {
        assert!(GithubClientError::RateLimitExceeded.is_environmental());
        assert!(GithubClientError::AuthError("x".into()).is_environmental());
        assert!(!GithubClientError::NetworkError("x".into()).is_environmental());
    }

    #[test]
    fn write_permission_threshold() {
        assert!(!RepoPermission::Pull.can_write());
        assert!(!RepoPermission::Triage.can_write());
        assert!(RepoPermission::Push.can_write());
        assert!(RepoPermission::Maintain.can_write());
        assert!(RepoPermission::Admin.can_write());
    }

    #[test]
    fn permission_from_flags_picks_highest() {
        assert_eq!(
            RepoPermission::from_flags(false, false, true, true, true),
            Some(RepoPermission::Push)
        );
        assert_eq!(
            RepoPermission::from_flags(false, false, false, false, false),
            None
        );
    }
}
