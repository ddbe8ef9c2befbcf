//! Owners validation check.
//!
//! This check verifies that owners specified in CODEOWNERS actually exist on
//! GitHub and may review changes in the configured repository:
//!
//! - `@username`: the user exists and is a member or outside collaborator of
//!   the repository's organization
//! - `@org/team`: the team belongs to the repository's organization, exists,
//!   and has write access to the repository
//! - `email@domain.com`: accepted on shape alone
//!
//! Organization members, outside collaborators and teams are each fetched
//! with one paginated listing the first time they are needed and kept for the
//! rest of the run. Each distinct owner string is validated once per run.

use super::syntax::MISSING_OWNER;
use super::{Check, CheckInput};
use crate::validate::github_client::{GithubClient, GithubClientError, UserExistsResult};
use crate::validate::syntax::OwnerKind;
use crate::validate::{CancellationToken, CheckError, CheckOutput, ConfigError, Issue};
use async_trait::async_trait;
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// A check that validates owners against GitHub.
pub struct OwnersCheck {
    client: Arc<dyn GithubClient>,
    org: String,
    repo: String,
    ignored_owners: HashSet<String>,
    owners_must_be_teams: bool,
    allow_unowned_patterns: bool,
}

impl std::fmt::Debug for OwnersCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnersCheck")
            .field("org", &self.org)
            .field("repo", &self.repo)
            .field("ignored_owners", &self.ignored_owners)
            .field("owners_must_be_teams", &self.owners_must_be_teams)
            .field("allow_unowned_patterns", &self.allow_unowned_patterns)
            .finish_non_exhaustive()
    }
}

impl OwnersCheck {
    /// Creates an owners check for `repository` in `owner/repo` format.
    pub fn new(client: Arc<dyn GithubClient>, repository: &str) -> Result<Self, ConfigError> {
        let (org, repo) = split_repository(repository)?;
        Ok(Self {
            client,
            org: org.to_string(),
            repo: repo.to_string(),
            ignored_owners: HashSet::new(),
            owners_must_be_teams: false,
            allow_unowned_patterns: true,
        })
    }

    pub fn with_ignored_owners(mut self, owners: HashSet<String>) -> Self {
        self.ignored_owners = owners;
        self
    }

    /// Rejects every owner that is not an `@org/team`.
    pub fn with_owners_must_be_teams(mut self, value: bool) -> Self {
        self.owners_must_be_teams = value;
        self
    }

    pub fn with_allow_unowned_patterns(mut self, value: bool) -> Self {
        self.allow_unowned_patterns = value;
        self
    }

    async fn validate_owner(
        &self,
        owner: &str,
        directory: &mut OrgDirectory,
        cancel: &CancellationToken,
    ) -> Result<(), Rejection> {
        let kind = OwnerKind::classify(owner);

        if self.owners_must_be_teams && !kind.is_team() {
            debug!("Owner {} rejected: owners must be teams", owner);
            return Err(Rejection::Issue(Issue::error(format!(
                "Only team owners allowed and {owner:?} is not a team"
            ))));
        }

        match kind {
            OwnerKind::User { name } if !name.is_empty() => {
                self.validate_user(owner, name, directory, cancel).await
            }
            OwnerKind::Team { org, team } if !org.is_empty() => {
                self.validate_team(owner, org, team, directory, cancel).await
            }
            OwnerKind::Email => {
                trace!("Accepting email owner {}", owner);
                Ok(())
            }
            // Empty handle segments never reach GitHub.
            _ => Err(Rejection::Issue(Issue::error(format!(
                "Not valid owner definition {owner:?}"
            )))),
        }
    }

    async fn validate_user(
        &self,
        owner: &str,
        name: &str,
        directory: &mut OrgDirectory,
        cancel: &CancellationToken,
    ) -> Result<(), Rejection> {
        trace!("Checking if user {} exists", owner);
        match remote(cancel, self.client.user_exists(name)).await? {
            UserExistsResult::Exists => {}
            UserExistsResult::NotFound => {
                return Err(Rejection::Issue(Issue::error(format!(
                    "User {owner:?} does not have github account"
                ))));
            }
            UserExistsResult::Unauthorized => {
                return Err(Rejection::from_remote(GithubClientError::AuthError(
                    format!("not authorized to look up user {owner:?}"),
                )));
            }
        }

        let login = name.to_lowercase();
        let members = cached(&mut directory.members, cancel, || {
            self.client.list_org_members(&self.org)
        })
        .await?;
        if members.contains(&login) {
            return Ok(());
        }

        let collaborators = cached(&mut directory.collaborators, cancel, || {
            self.client.list_outside_collaborators(&self.org)
        })
        .await?;
        if collaborators.contains(&login) {
            return Ok(());
        }

        Err(Rejection::Issue(Issue::error(format!(
            "User {owner:?} is not a member of the organization {:?}",
            self.org
        ))))
    }

    async fn validate_team(
        &self,
        owner: &str,
        org: &str,
        team: &str,
        directory: &mut OrgDirectory,
        cancel: &CancellationToken,
    ) -> Result<(), Rejection> {
        if !org.eq_ignore_ascii_case(&self.org) {
            return Err(Rejection::Issue(Issue::error(format!(
                "Team {owner:?} does not belong to {:?} organization.",
                self.org
            ))));
        }

        let teams = cached(&mut directory.teams, cancel, || {
            self.client.list_org_teams(&self.org)
        })
        .await?;
        if !teams.contains(&team.to_lowercase()) {
            return Err(Rejection::Issue(Issue::error(format!(
                "Team {owner:?} does not exist in organization {:?}.",
                self.org
            ))));
        }

        trace!("Checking permission of {} on {}/{}", owner, self.org, self.repo);
        let permission = remote(
            cancel,
            self.client
                .team_repo_permission(&self.org, team, &self.org, &self.repo),
        )
        .await?;

        match permission {
            Some(permission) if permission.can_write() => Ok(()),
            Some(permission) => Err(Rejection::Issue(Issue::error(format!(
                "Team {owner:?} cannot review PRs on {:?} as it has only {permission} access; write access is required.",
                self.repository()
            )))),
            None => Err(Rejection::Issue(Issue::error(format!(
                "Team {owner:?} has no permissions associated with the repository {:?}.",
                self.repository()
            )))),
        }
    }

    fn repository(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}

#[async_trait]
impl Check for OwnersCheck {
    fn name(&self) -> &'static str {
        "owners"
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        cancel.check()?;

        let mut output = CheckOutput::new();
        let mut directory = OrgDirectory::default();
        let mut checked: HashSet<&str> = HashSet::new();

        for entry in input.entries.iter() {
            cancel.check()?;

            if entry.is_unowned() && !self.allow_unowned_patterns {
                output.report(Issue::error(MISSING_OWNER).for_entry(entry));
                continue;
            }

            for owner in &entry.owners {
                cancel.check()?;

                if self.ignored_owners.contains(owner) {
                    trace!("Skipping ignored owner: {}", owner);
                    continue;
                }
                if !checked.insert(owner.as_str()) {
                    continue;
                }

                match self.validate_owner(owner, &mut directory, cancel).await {
                    Ok(()) => {}
                    Err(Rejection::Issue(issue)) => output.report(issue.for_entry(entry)),
                    Err(Rejection::Halt(issue)) => {
                        output.report(issue.for_entry(entry));
                        return Ok(output);
                    }
                    Err(Rejection::Cancelled) => return Err(CheckError::Cancelled),
                }
            }
        }

        Ok(output)
    }
}

/// Splits `owner/repo`, rejecting anything else.
pub(crate) fn split_repository(repository: &str) -> Result<(&str, &str), ConfigError> {
    match repository.split_once('/') {
        Some((org, repo)) if !org.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((org, repo))
        }
        _ => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

/// Lazily filled, lowercased logins and slugs of the repository's organization.
#[derive(Debug, Default)]
struct OrgDirectory {
    members: Option<HashSet<String>>,
    collaborators: Option<HashSet<String>>,
    teams: Option<HashSet<String>>,
}

/// Why an owner did not pass validation.
#[derive(Debug)]
enum Rejection {
    /// Reported; validation continues with the next owner.
    Issue(Issue),
    /// Reported; no further lookup can succeed during this run.
    Halt(Issue),
    Cancelled,
}

impl Rejection {
    fn from_remote(err: GithubClientError) -> Self {
        if !err.is_permanent() {
            return Rejection::Issue(Issue::error(format!(
                "HTTP error occurred while calling GitHub: {err}"
            )));
        }

        if err.is_environmental() {
            warn!("Stopping owner validation: {}", err);
            Rejection::Halt(Issue::warning(format!(
                "Owner validation stopped early: {err}"
            )))
        } else {
            Rejection::Halt(Issue::error(format!(
                "Unknown error occurred while calling GitHub: {err}"
            )))
        }
    }
}

/// Awaits a remote call, giving up as soon as the run is cancelled.
async fn remote<T, F>(cancel: &CancellationToken, call: F) -> Result<T, Rejection>
where
    F: Future<Output = Result<T, GithubClientError>>,
{
    match cancel.run_until_cancelled(call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Rejection::from_remote(err)),
        Err(_) => Err(Rejection::Cancelled),
    }
}

/// Returns the cached set, fetching it on first use.
async fn cached<'c, F, Fut>(
    slot: &'c mut Option<HashSet<String>>,
    cancel: &CancellationToken,
    fetch: F,
) -> Result<&'c HashSet<String>, Rejection>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<String>, GithubClientError>>,
{
    if slot.is_none() {
        let items = remote(cancel, fetch()).await?;
        debug!("Cached {} organization entries", items.len());
        *slot = Some(items.iter().map(|item| item.to_lowercase()).collect());
    }
    Ok(slot.get_or_insert_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Entry;
    use crate::validate::Severity;
    use crate::validate::github_client::RepoPermission;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGithub {
        users: HashSet<String>,
        members: Vec<String>,
        collaborators: Vec<String>,
        teams: Vec<String>,
        permissions: HashMap<String, RepoPermission>,
        user_error: Option<GithubClientError>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGithub {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GithubClient for FakeGithub {
        async fn user_exists(&self, username: &str) -> Result<UserExistsResult, GithubClientError> {
            self.record(format!("user:{username}"));
            if let Some(err) = &self.user_error {
                return Err(err.clone());
            }
            Ok(if self.users.contains(username) {
                UserExistsResult::Exists
            } else {
                UserExistsResult::NotFound
            })
        }

        async fn list_org_members(&self, org: &str) -> Result<Vec<String>, GithubClientError> {
            self.record(format!("members:{org}"));
            Ok(self.members.clone())
        }

        async fn list_outside_collaborators(
            &self,
            org: &str,
        ) -> Result<Vec<String>, GithubClientError> {
            self.record(format!("collaborators:{org}"));
            Ok(self.collaborators.clone())
        }

        async fn list_org_teams(&self, org: &str) -> Result<Vec<String>, GithubClientError> {
            self.record(format!("teams:{org}"));
            Ok(self.teams.clone())
        }

        async fn team_repo_permission(
            &self,
            org: &str,
            team: &str,
            owner: &str,
            repo: &str,
        ) -> Result<Option<RepoPermission>, GithubClientError> {
            self.record(format!("permission:{org}/{team}@{owner}/{repo}"));
            Ok(self.permissions.get(team).copied())
        }
    }

    fn org_fixture() -> FakeGithub {
        FakeGithub {
            users: ["alice", "bob", "carol"].map(String::from).into(),
            members: vec!["Alice".into()],
            collaborators: vec!["carol".into()],
            teams: vec!["core".into(), "readers".into(), "orphans".into()],
            permissions: HashMap::from([
                ("core".to_string(), RepoPermission::Maintain),
                ("readers".to_string(), RepoPermission::Pull),
            ]),
            ..FakeGithub::default()
        }
    }

    async fn run(
        client: Arc<FakeGithub>,
        configure: impl FnOnce(OwnersCheck) -> OwnersCheck,
        entries: Vec<Entry>,
    ) -> CheckOutput {
        let check = configure(OwnersCheck::new(client, "acme/widgets").unwrap());
        check
            .check(
                &CheckInput::new("/repo", entries),
                &CancellationToken::new(),
            )
            .await
            .unwrap()
    }

    fn messages(output: &CheckOutput) -> Vec<&str> {
        output.issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn repository_must_be_owner_slash_repo() {
        let client: Arc<dyn GithubClient> = Arc::new(FakeGithub::default());
        for bad in ["", "acme", "/widgets", "acme/", "acme/widgets/extra"] {
            assert_eq!(
                OwnersCheck::new(client.clone(), bad).unwrap_err(),
                ConfigError::InvalidRepository(bad.to_string())
            );
        }
        assert!(OwnersCheck::new(client, "acme/widgets").is_ok());
    }

    #[tokio::test]
    async fn members_and_collaborators_pass() {
        let client = Arc::new(org_fixture());
        let output = run(
            client.clone(),
            |c| c,
            vec![Entry::new(1, "*", ["@alice", "@carol", "dev@acme.io"])],
        )
        .await;

        assert!(output.is_ok(), "{:?}", output.issues);
    }

    #[tokio::test]
    async fn unknown_and_foreign_users() {
        let client = Arc::new(org_fixture());
        let output = run(
            client,
            |c| c,
            vec![
                Entry::new(1, "/a", ["@mallory"]),
                Entry::new(2, "/b", ["@bob"]),
            ],
        )
        .await;

        assert_eq!(
            output.issues,
            vec![
                Issue::error("User \"@mallory\" does not have github account").at_line(1),
                Issue::error("User \"@bob\" is not a member of the organization \"acme\"")
                    .at_line(2),
            ]
        );
    }

    #[tokio::test]
    async fn owners_are_validated_once_and_listings_cached() {
        let client = Arc::new(org_fixture());
        let output = run(
            client.clone(),
            |c| c,
            vec![
                Entry::new(1, "/a", ["@bob"]),
                Entry::new(2, "/b", ["@bob", "@alice"]),
                Entry::new(3, "/c", ["@carol"]),
            ],
        )
        .await;

        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].line, Some(1));
        assert_eq!(
            client.calls(),
            vec![
                "user:bob",
                "members:acme",
                "collaborators:acme",
                "user:alice",
                "user:carol",
            ]
        );
    }

    #[tokio::test]
    async fn team_checks() {
        let client = Arc::new(org_fixture());
        let output = run(
            client.clone(),
            |c| c,
            vec![
                Entry::new(1, "/a", ["@ACME/core"]),
                Entry::new(2, "/b", ["@other/core"]),
                Entry::new(3, "/c", ["@acme/ghosts"]),
                Entry::new(4, "/d", ["@acme/readers"]),
                Entry::new(5, "/e", ["@acme/orphans"]),
            ],
        )
        .await;

        assert_eq!(
            messages(&output),
            vec![
                "Team \"@other/core\" does not belong to \"acme\" organization.",
                "Team \"@acme/ghosts\" does not exist in organization \"acme\".",
                "Team \"@acme/readers\" cannot review PRs on \"acme/widgets\" as it has only pull access; write access is required.",
                "Team \"@acme/orphans\" has no permissions associated with the repository \"acme/widgets\".",
            ]
        );
        assert_eq!(
            client
                .calls()
                .iter()
                .filter(|c| c.starts_with("teams:"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn ignored_and_invalid_owners() {
        let client = Arc::new(org_fixture());
        let output = run(
            client.clone(),
            |c| c.with_ignored_owners(HashSet::from(["@ghost".to_string()])),
            vec![Entry::new(1, "*", ["@ghost", "@a/b/c", "nobody", "@", "@/core"])],
        )
        .await;

        assert_eq!(
            messages(&output),
            vec![
                "Not valid owner definition \"@a/b/c\"",
                "Not valid owner definition \"nobody\"",
                "Not valid owner definition \"@\"",
                "Not valid owner definition \"@/core\"",
            ]
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn owners_must_be_teams() {
        let client = Arc::new(org_fixture());
        let output = run(
            client,
            |c| c.with_owners_must_be_teams(true),
            vec![Entry::new(1, "*", ["@alice", "@acme/core", "dev@acme.io"])],
        )
        .await;

        assert_eq!(
            messages(&output),
            vec![
                "Only team owners allowed and \"@alice\" is not a team",
                "Only team owners allowed and \"dev@acme.io\" is not a team",
            ]
        );
    }

    #[tokio::test]
    async fn unowned_patterns() {
        let entries = vec![Entry::new(3, "/docs", Vec::<String>::new())];

        let allowed = run(Arc::new(org_fixture()), |c| c, entries.clone()).await;
        assert!(allowed.is_ok());

        let rejected = run(
            Arc::new(org_fixture()),
            |c| c.with_allow_unowned_patterns(false),
            entries,
        )
        .await;
        assert_eq!(rejected.issues, vec![Issue::error(MISSING_OWNER).at_line(3)]);
    }

    #[tokio::test]
    async fn rate_limit_halts_with_warning() {
        let client = Arc::new(FakeGithub {
            user_error: Some(GithubClientError::RateLimitExceeded),
            ..org_fixture()
        });
        let output = run(
            client.clone(),
            |c| c,
            vec![Entry::new(1, "*", ["@alice", "@bob", "@acme/core"])],
        )
        .await;

        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].severity, Severity::Warning);
        assert_eq!(client.calls(), vec!["user:alice"]);
    }

    #[tokio::test]
    async fn transport_failure_halts_with_error() {
        let client = Arc::new(FakeGithub {
            user_error: Some(GithubClientError::NetworkError("connection reset".into())),
            ..org_fixture()
        });
        let output = run(client.clone(), |c| c, vec![Entry::new(1, "*", ["@alice", "@bob"])]).await;

        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].severity, Severity::Error);
        assert!(output.issues[0].message.contains("connection reset"));
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn api_error_continues() {
        let client = Arc::new(FakeGithub {
            user_error: Some(GithubClientError::ApiError("422".into())),
            ..org_fixture()
        });
        let output = run(client.clone(), |c| c, vec![Entry::new(1, "*", ["@alice", "@bob"])]).await;

        assert_eq!(output.issues.len(), 2);
        assert!(
            output
                .issues
                .iter()
                .all(|i| i.message.starts_with("HTTP error occurred while calling GitHub"))
        );
    }

    #[tokio::test]
    async fn cancelled_run_returns_error() {
        let check = OwnersCheck::new(Arc::new(org_fixture()), "acme/widgets").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = check
            .check(
                &CheckInput::new("/repo", vec![Entry::new(1, "*", ["@alice"])]),
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(CheckError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_with_no_entries() {
        let check = OwnersCheck::new(Arc::new(org_fixture()), "acme/widgets").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = check
            .check(&CheckInput::new("/repo", Vec::<Entry>::new()), &cancel)
            .await;
        assert!(matches!(result, Err(CheckError::Cancelled)));
    }
}
