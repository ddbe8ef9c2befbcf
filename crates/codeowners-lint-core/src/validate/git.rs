//! Thin async wrapper around the `git` binary.

use crate::validate::{CancellationToken, CheckError};
use log::trace;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Runs git commands inside one repository.
#[derive(Debug, Clone)]
pub struct Git {
    repo_dir: PathBuf,
    trust_workspace: bool,
}

impl Git {
    /// `trust_workspace` marks the repository as a `safe.directory` for
    /// every invocation, for checkouts owned by another user.
    pub fn new(repo_dir: impl Into<PathBuf>, trust_workspace: bool) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            trust_workspace,
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Runs `git <args>` and returns its stdout.
    ///
    /// With a token the child is killed as soon as the run is cancelled.
    /// Cleanup commands pass `None` so they always run to completion.
    pub async fn run(
        &self,
        args: &[&str],
        cancel: Option<&CancellationToken>,
    ) -> Result<String, CheckError> {
        let mut command = Command::new("git");
        if self.trust_workspace {
            command
                .arg("-c")
                .arg(format!("safe.directory={}", self.repo_dir.display()));
        }
        command
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        trace!("Running git {} in {:?}", args.join(" "), self.repo_dir);
        let output = match cancel {
            Some(cancel) => cancel.run_until_cancelled(command.output()).await??,
            None => command.output().await?,
        };

        if !output.status.success() {
            return Err(CheckError::Git {
                command: args.iter().take(2).copied().collect::<Vec<_>>().join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Splits NUL-separated `-z` output into paths.
pub fn split_nul(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}
