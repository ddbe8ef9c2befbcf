//! Not-owned files check.
//!
//! This check identifies tracked files that are not covered by any
//! CODEOWNERS rule. Git does the matching: every CODEOWNERS pattern that is
//! not a skip pattern is appended to the root `.gitignore`, files that become
//! ignored are removed from the index, and whatever `git ls-files` still
//! lists has no owner.
//!
//! The repository is modified in place while the check runs, so it refuses
//! to start on a dirty work tree and always restores it afterwards. Nothing
//! guards against a second instance, or another git user, touching the same
//! repository at the same time; callers must not allow that.

use super::{Check, CheckInput};
use crate::parse::Entry;
use crate::validate::git::{Git, split_nul};
use crate::validate::{CancellationToken, CheckError, CheckOutput, Issue};
use async_trait::async_trait;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Files passed to a single `git rm --cached` invocation.
const RM_CHUNK_SIZE: usize = 256;

pub(crate) const EMPTY_CODEOWNERS: &str =
    "The CODEOWNERS file is empty. The files in the repository don't have any owner.";

/// A check that reports tracked files without CODEOWNERS coverage.
#[derive(Debug, Clone, Default)]
pub struct NotOwnedCheck {
    skip_patterns: Vec<String>,
    subdirectories: Vec<String>,
    trust_workspace: bool,
}

impl NotOwnedCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries whose pattern is exactly one of these do not count as
    /// ownership, e.g. a catch-all `*`.
    pub fn with_skip_patterns(mut self, patterns: Vec<String>) -> Self {
        self.skip_patterns = patterns;
        self
    }

    /// Restricts the reported files to these paths.
    pub fn with_subdirectories(mut self, paths: Vec<String>) -> Self {
        self.subdirectories = paths;
        self
    }

    pub fn with_trust_workspace(mut self, value: bool) -> Self {
        self.trust_workspace = value;
        self
    }

    fn ignore_lines(
        &self,
        entries: &[Entry],
        cancel: &CancellationToken,
    ) -> Result<String, CheckError> {
        let mut lines = String::new();
        for entry in entries {
            cancel.check()?;
            if self.skip_patterns.contains(&entry.pattern) {
                debug!("Skipping pattern {:?} on line {}", entry.pattern, entry.line_number);
                continue;
            }
            lines.push_str(&entry.pattern);
            lines.push('\n');
        }
        Ok(lines)
    }

    /// Runs the git pipeline against an already-modified `.gitignore`.
    async fn tracked_after_ignore(
        &self,
        git: &Git,
        gitignore: &GitignoreBackup,
        ignore_lines: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, CheckError> {
        gitignore.append(ignore_lines)?;

        let ignored = git
            .run(
                &["ls-files", "-z", "--cached", "--ignored", "--exclude-standard"],
                Some(cancel),
            )
            .await?;
        let ignored = split_nul(&ignored);
        debug!("{} tracked files are covered by CODEOWNERS", ignored.len());

        for chunk in ignored.chunks(RM_CHUNK_SIZE) {
            cancel.check()?;
            let mut args = vec!["rm", "--cached", "-q", "--"];
            args.extend(chunk.iter().map(String::as_str));
            git.run(&args, Some(cancel)).await?;
        }

        let mut args = vec!["ls-files", "-z"];
        if !self.subdirectories.is_empty() {
            args.push("--");
            args.extend(self.subdirectories.iter().map(String::as_str));
        }
        let remaining = git.run(&args, Some(cancel)).await?;
        Ok(split_nul(&remaining))
    }

    /// Puts the work tree back the way it was found. Never cancellable.
    async fn restore(git: &Git, gitignore: &GitignoreBackup) -> Result<(), CheckError> {
        let reset = git.run(&["reset", "--hard", "-q"], None).await.map(drop);
        let restored = gitignore.restore().map_err(CheckError::from);
        reset.and(restored)
    }

    fn report(&self, files: Vec<String>) -> CheckOutput {
        let mut output = CheckOutput::new();
        if !files.is_empty() {
            let list = files
                .iter()
                .map(|file| format!("            * {file}"))
                .collect::<Vec<_>>()
                .join("\n");
            output.report(Issue::warning(format!(
                "Found {} not owned files (skipped patterns: {:?}):\n{}",
                files.len(),
                self.skip_patterns.join(","),
                list
            )));
        }
        output
    }
}

#[async_trait]
impl Check for NotOwnedCheck {
    fn name(&self) -> &'static str {
        "notowned"
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        cancel.check()?;

        if input.entries.is_empty() {
            let mut output = CheckOutput::new();
            output.report(Issue::warning(EMPTY_CODEOWNERS));
            return Ok(output);
        }

        let ignore_lines = self.ignore_lines(&input.entries, cancel)?;
        let git = Git::new(&input.repo_dir, self.trust_workspace);

        let status = git.run(&["status", "--porcelain"], Some(cancel)).await?;
        if !status.trim().is_empty() {
            return Err(CheckError::DirtyWorkTree {
                status: status.trim_end().to_string(),
            });
        }

        let gitignore = GitignoreBackup::capture(git.repo_dir())?;
        let result = self
            .tracked_after_ignore(&git, &gitignore, &ignore_lines, cancel)
            .await;
        let restored = Self::restore(&git, &gitignore).await;

        match (result, restored) {
            (Ok(files), Ok(())) => Ok(self.report(files)),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(restore_err)) => {
                warn!(
                    "Failed to restore {:?} after an error: {}",
                    git.repo_dir(),
                    restore_err
                );
                Err(err)
            }
        }
    }
}

/// The root `.gitignore` as it was before the check touched it.
#[derive(Debug)]
struct GitignoreBackup {
    path: PathBuf,
    original: Option<Vec<u8>>,
}

impl GitignoreBackup {
    fn capture(repo_dir: &Path) -> io::Result<Self> {
        let path = repo_dir.join(".gitignore");
        let original = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };
        Ok(Self { path, original })
    }

    fn append(&self, lines: &str) -> io::Result<()> {
        let mut content = self.original.clone().unwrap_or_default();
        if content.last().is_some_and(|byte| *byte != b'\n') {
            content.push(b'\n');
        }
        content.extend_from_slice(lines.as_bytes());
        fs::write(&self.path, content)
    }

    fn restore(&self) -> io::Result<()> {
        match &self.original {
            Some(bytes) => fs::write(&self.path, bytes),
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            },
        }
    }
}
