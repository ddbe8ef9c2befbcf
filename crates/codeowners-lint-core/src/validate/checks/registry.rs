//! The closed catalog of checks and how they are built from configuration.

use super::{
    AvoidShadowingCheck, Check, CheckConfig, CheckInput, DupPatternsCheck, FilesCheck,
    NotOwnedCheck, OwnersCheck, SyntaxCheck,
};
use crate::validate::github_client::GithubClient;
use crate::validate::{CancellationToken, CheckError, CheckOutput, ConfigError, Severity};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Every check this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckName {
    Syntax,
    Duppatterns,
    Files,
    Owners,
    Notowned,
    AvoidShadowing,
}

impl CheckName {
    /// Checks enabled when no selection is given.
    pub const STANDARD: [CheckName; 4] = [
        CheckName::Files,
        CheckName::Owners,
        CheckName::Duppatterns,
        CheckName::Syntax,
    ];

    /// Checks that only run when asked for explicitly.
    pub const EXPERIMENTAL: [CheckName; 2] = [CheckName::Notowned, CheckName::AvoidShadowing];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Syntax => "syntax",
            CheckName::Duppatterns => "duppatterns",
            CheckName::Files => "files",
            CheckName::Owners => "owners",
            CheckName::Notowned => "notowned",
            CheckName::AvoidShadowing => "avoid-shadowing",
        }
    }

    pub fn is_experimental(&self) -> bool {
        Self::EXPERIMENTAL.contains(self)
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::STANDARD
            .into_iter()
            .chain(Self::EXPERIMENTAL)
            .find(|check| check.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownCheck(name.to_string()))
    }
}

/// Parses `check=level` pairs separated by commas, e.g. `files=warning`.
pub fn parse_severity_overrides(input: &str) -> Result<HashMap<CheckName, Severity>, ConfigError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let invalid = || ConfigError::InvalidSeverityOverride(pair.to_string());
            let (name, level) = pair.split_once('=').ok_or_else(invalid)?;
            let name = name.parse::<CheckName>()?;
            let level = level.parse::<Severity>().map_err(|_| invalid())?;
            Ok((name, level))
        })
        .collect()
}

/// Wraps a check and re-tags every issue it reports.
pub struct SeverityOverride<C> {
    inner: C,
    severity: Severity,
}

impl<C: Check> SeverityOverride<C> {
    pub fn new(inner: C, severity: Severity) -> Self {
        Self { inner, severity }
    }
}

#[async_trait]
impl<C: Check> Check for SeverityOverride<C> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        let output = self.inner.check(input, cancel).await?;
        Ok(output.with_severity(self.severity))
    }
}

/// Instantiates the selected checks in the given order.
///
/// The `owners` check needs both a GitHub client and `config.repository`;
/// anything missing is reported before a single check runs.
pub fn build_checks(
    names: &[CheckName],
    config: &CheckConfig,
    github: Option<Arc<dyn GithubClient>>,
) -> Result<Vec<Arc<dyn Check>>, ConfigError> {
    let mut checks = Vec::with_capacity(names.len());
    for &name in names {
        let check = match name {
            CheckName::Syntax => wrap(
                SyntaxCheck::new().with_allow_unowned_patterns(config.allow_unowned_patterns),
                name,
                config,
            ),
            CheckName::Duppatterns => wrap(DupPatternsCheck::new(), name, config),
            CheckName::Files => wrap(FilesCheck::new(), name, config),
            CheckName::Owners => {
                let client = github.clone().ok_or_else(|| {
                    ConfigError::MissingRequired("GitHub client for the owners check".to_string())
                })?;
                let repository = config.repository.as_deref().ok_or_else(|| {
                    ConfigError::MissingRequired("repository for the owners check".to_string())
                })?;
                let check = OwnersCheck::new(client, repository)?
                    .with_ignored_owners(config.ignored_owners.clone())
                    .with_owners_must_be_teams(config.owners_must_be_teams)
                    .with_allow_unowned_patterns(config.allow_unowned_patterns);
                wrap(check, name, config)
            }
            CheckName::Notowned => wrap(
                NotOwnedCheck::new()
                    .with_skip_patterns(config.skip_patterns.clone())
                    .with_subdirectories(config.subdirectories.clone())
                    .with_trust_workspace(config.trust_workspace),
                name,
                config,
            ),
            CheckName::AvoidShadowing => wrap(AvoidShadowingCheck::new(), name, config),
        };
        checks.push(check);
    }
    Ok(checks)
}

fn wrap<C: Check + 'static>(check: C, name: CheckName, config: &CheckConfig) -> Arc<dyn Check> {
    match config.severity_overrides.get(&name) {
        Some(&severity) => {
            debug!("Reporting every {} issue as {}", name, severity);
            Arc::new(SeverityOverride::new(check, severity))
        }
        None => Arc::new(check),
    }
}
