//! GitHub client implementation using octocrab.
//!
//! This module provides the octocrab-based implementation of the GithubClient
//! trait for use in the CLI. Listings are fetched 100 per page and every page
//! is followed.

use async_trait::async_trait;
use codeowners_lint_core::validate::github_client::{
    GithubClient, GithubClientError, RepoPermission, UserExistsResult,
};
use http::StatusCode;
use http::header::{ACCEPT, HeaderMap, HeaderValue};
use octocrab::Page;
use serde::{Deserialize, Serialize};

/// Media type that makes the team repository endpoint return permissions.
const REPOSITORY_MEDIA_TYPE: &str = "application/vnd.github.v3.repository+json";

/// A wrapper around `octocrab::Octocrab` that implements `GithubClient`.
///
/// This wrapper is necessary due to Rust's orphan rules, which prevent
/// implementing external traits on external types.
pub struct OctocrabClient(pub octocrab::Octocrab);

impl OctocrabClient {
    /// Creates a new OctocrabClient from an Octocrab instance.
    pub fn new(client: octocrab::Octocrab) -> Self {
        Self(client)
    }

    /// Fetches every page of a listing.
    async fn list_all<T>(&self, route: &str) -> Result<Vec<T>, GithubClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let first: Page<T> = self
            .0
            .get(route, Some(&PerPage { per_page: 100 }))
            .await
            .map_err(classify)?;
        self.0.all_pages(first).await.map_err(classify)
    }
}

#[derive(Serialize)]
struct PerPage {
    per_page: u8,
}

#[derive(Deserialize)]
struct Account {
    login: String,
}

#[derive(Deserialize)]
struct Team {
    slug: String,
}

#[derive(Deserialize)]
struct TeamRepository {
    #[serde(default)]
    permissions: Permissions,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Permissions {
    admin: bool,
    maintain: bool,
    push: bool,
    triage: bool,
    pull: bool,
}

/// Extracts the HTTP status code from an octocrab error.
fn extract_status_code(error: &octocrab::Error) -> Option<StatusCode> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code),
        _ => None,
    }
}

/// Sorts an octocrab error into the categories the owners check acts on.
fn classify(error: octocrab::Error) -> GithubClientError {
    let octocrab::Error::GitHub { source, .. } = &error else {
        return GithubClientError::NetworkError(error.to_string());
    };

    let rate_limited = source.message.to_ascii_lowercase().contains("rate limit");
    match source.status_code {
        StatusCode::TOO_MANY_REQUESTS => GithubClientError::RateLimitExceeded,
        StatusCode::FORBIDDEN if rate_limited => GithubClientError::RateLimitExceeded,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GithubClientError::AuthError(source.message.clone())
        }
        status => GithubClientError::ApiError(format!("{}: {}", status, source.message)),
    }
}

#[async_trait]
impl GithubClient for OctocrabClient {
    async fn user_exists(&self, username: &str) -> Result<UserExistsResult, GithubClientError> {
        let route = format!("/users/{username}");
        match self.0.get::<Account, _, ()>(&route, None).await {
            Ok(_) => Ok(UserExistsResult::Exists),
            Err(e) => match extract_status_code(&e) {
                Some(StatusCode::NOT_FOUND) => Ok(UserExistsResult::NotFound),
                Some(StatusCode::UNAUTHORIZED) => Ok(UserExistsResult::Unauthorized),
                _ => Err(classify(e)),
            },
        }
    }

    async fn list_org_members(&self, org: &str) -> Result<Vec<String>, GithubClientError> {
        let members: Vec<Account> = self.list_all(&format!("/orgs/{org}/members")).await?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }

    async fn list_outside_collaborators(
        &self,
        org: &str,
    ) -> Result<Vec<String>, GithubClientError> {
        let collaborators: Vec<Account> = self
            .list_all(&format!("/orgs/{org}/outside_collaborators"))
            .await?;
        Ok(collaborators.into_iter().map(|c| c.login).collect())
    }

    async fn list_org_teams(&self, org: &str) -> Result<Vec<String>, GithubClientError> {
        let teams: Vec<Team> = self.list_all(&format!("/orgs/{org}/teams")).await?;
        Ok(teams.into_iter().map(|t| t.slug).collect())
    }

    async fn team_repo_permission(
        &self,
        org: &str,
        team: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Option<RepoPermission>, GithubClientError> {
        let route = format!("/orgs/{org}/teams/{team}/repos/{owner}/{repo}");
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(REPOSITORY_MEDIA_TYPE));

        match self
            .0
            .get_with_headers::<TeamRepository, _, ()>(&route, None, Some(headers))
            .await
        {
            Ok(repository) => {
                let p = repository.permissions;
                Ok(RepoPermission::from_flags(
                    p.admin, p.maintain, p.push, p.triage, p.pull,
                ))
            }
            Err(e) if extract_status_code(&e) == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> OctocrabClient {
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(server.uri())
            .unwrap()
            .build()
            .unwrap();
        OctocrabClient::new(octocrab)
    }

    fn github_error(message: &str) -> serde_json::Value {
        json!({ "message": message, "documentation_url": "https://docs.github.com" })
    }

    #[tokio::test]
    async fn user_lookup_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octocat" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/nobody"))
            .respond_with(ResponseTemplate::new(404).set_body_json(github_error("Not Found")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/secret"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(github_error("Bad credentials")),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.user_exists("octocat").await.unwrap(),
            UserExistsResult::Exists
        );
        assert_eq!(
            client.user_exists("nobody").await.unwrap(),
            UserExistsResult::NotFound
        );
        assert_eq!(
            client.user_exists("secret").await.unwrap(),
            UserExistsResult::Unauthorized
        );
    }

    #[tokio::test]
    async fn rate_limit_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(403).set_body_json(github_error(
                "API rate limit exceeded for 127.0.0.1.",
            )))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .user_exists("octocat")
            .await
            .unwrap_err();
        assert!(matches!(err, GithubClientError::RateLimitExceeded));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn members_follow_pagination() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/orgs/acme/members?per_page=100&page=2>; rel=\"next\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .and(query_param_is_missing("page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(json!([{ "login": "alice" }, { "login": "bob" }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "login": "carol" }])))
            .mount(&server)
            .await;

        let members = client_for(&server)
            .await
            .list_org_members("acme")
            .await
            .unwrap();
        assert_eq!(members, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn teams_and_collaborators() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/teams"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "slug": "core", "name": "Core" }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/outside_collaborators"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "login": "dana" }])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.list_org_teams("acme").await.unwrap(), vec!["core"]);
        assert_eq!(
            client.list_outside_collaborators("acme").await.unwrap(),
            vec!["dana"]
        );
    }

    #[tokio::test]
    async fn team_permission_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/teams/core/repos/acme/widgets"))
            .and(header("accept", REPOSITORY_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": "acme/widgets",
                "permissions": {
                    "admin": false, "maintain": false, "push": true, "triage": true, "pull": true
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/teams/outsiders/repos/acme/widgets"))
            .respond_with(ResponseTemplate::new(404).set_body_json(github_error("Not Found")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client
                .team_repo_permission("acme", "core", "acme", "widgets")
                .await
                .unwrap(),
            Some(RepoPermission::Push)
        );
        assert_eq!(
            client
                .team_repo_permission("acme", "outsiders", "acme", "widgets")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn validation_failures_are_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/teams"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(github_error("Validation Failed")),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .list_org_teams("acme")
            .await
            .unwrap_err();
        assert!(matches!(err, GithubClientError::ApiError(_)));
        assert!(!err.is_permanent());
    }
}
