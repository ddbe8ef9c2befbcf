//! Files existence check.
//!
//! This check verifies that patterns in CODEOWNERS actually match files in the repository.

use super::{Check, CheckInput};
use crate::matching::ExistenceGlob;
use crate::validate::file_walker::list_regular_files;
use crate::validate::{CancellationToken, CheckError, CheckOutput, Issue};
use async_trait::async_trait;
use log::{debug, trace};

/// A check that verifies patterns match existing files.
///
/// Patterns that don't match any files in the repository may indicate:
/// - Typos in the pattern
/// - Files that have been deleted
/// - Incorrect path assumptions
///
/// Only regular files count; a pattern that matches nothing but directories
/// is reported. Negated (`!`) patterns are not supported and never match.
#[derive(Debug, Clone, Default)]
pub struct FilesCheck;

impl FilesCheck {
    /// Creates a new files existence check.
    pub fn new() -> Self {
        Self
    }

    fn check_blocking(
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        let files = list_regular_files(&input.repo_dir, cancel)?;

        let mut output = CheckOutput::new();
        for entry in input.entries.iter() {
            cancel.check()?;
            trace!("Checking pattern: {}", entry.pattern);

            let glob = ExistenceGlob::new(&entry.pattern).map_err(|source| {
                CheckError::InvalidGlob {
                    pattern: entry.pattern.clone(),
                    source,
                }
            })?;

            if !files.iter().any(|file| glob.is_match(file)) {
                debug!(
                    "Pattern '{}' ({:?}) does not match any files",
                    entry.pattern,
                    glob.globs()
                );
                output.report(
                    Issue::error(format!(
                        "{:?} does not match any files in repository",
                        entry.pattern
                    ))
                    .for_entry(entry),
                );
            }
        }

        Ok(output)
    }
}

#[async_trait]
impl Check for FilesCheck {
    fn name(&self) -> &'static str {
        "files"
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        cancel.check()?;
        debug!("Running files check in {:?}", input.repo_dir);

        let input = input.clone();
        let walk_cancel = cancel.clone();
        let task = tokio::task::spawn_blocking(move || Self::check_blocking(&input, &walk_cancel));

        match cancel.run_until_cancelled(task).await? {
            Ok(result) => result,
            Err(join_error) => Err(CheckError::Aborted(join_error.to_string())),
        }
    }
}
