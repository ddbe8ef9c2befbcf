//! Syntax validation check.

use super::{Check, CheckInput};
use crate::parse::Entry;
use crate::validate::syntax::{is_valid_handle, looks_like_email};
use crate::validate::{CancellationToken, CheckError, CheckOutput, Issue};
use async_trait::async_trait;
use log::trace;

pub(crate) const MISSING_OWNER: &str = "Missing owner, at least one owner is required";

const INLINE_COMMENT: &str = "Comment (# sign) is not allowed in line with pattern entry. \
                              The correct format is: pattern owner1 ... ownerN";

/// A check that validates the shape of every entry.
///
/// - the pattern must not be empty
/// - `@` owners must be valid GitHub handles (warning otherwise)
/// - other owners must look like emails (error otherwise)
/// - a `#` token is an inline comment, reported once per line
/// - entries without owners are errors unless unowned patterns are allowed
#[derive(Debug, Clone)]
pub struct SyntaxCheck {
    allow_unowned_patterns: bool,
}

impl Default for SyntaxCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxCheck {
    /// Creates a new syntax check that allows unowned patterns.
    pub fn new() -> Self {
        Self {
            allow_unowned_patterns: true,
        }
    }

    pub fn with_allow_unowned_patterns(mut self, value: bool) -> Self {
        self.allow_unowned_patterns = value;
        self
    }

    fn check_entry(&self, entry: &Entry, output: &mut CheckOutput) {
        if entry.pattern.is_empty() {
            output.report(Issue::error("Missing pattern").for_entry(entry));
        }

        if entry.is_unowned() && !self.allow_unowned_patterns {
            output.report(Issue::error(MISSING_OWNER).for_entry(entry));
        }

        for owner in &entry.owners {
            match owner.as_str() {
                "" => continue,
                "#" => {
                    output.report(Issue::error(INLINE_COMMENT).for_entry(entry));
                    break;
                }
                handle if handle.starts_with('@') => {
                    if !is_valid_handle(handle) {
                        output.report(
                            Issue::warning(format!(
                                "Owner '{handle}' does not look like a GitHub username or team name"
                            ))
                            .for_entry(entry),
                        );
                    }
                }
                other => {
                    if !looks_like_email(other) {
                        output.report(
                            Issue::error(format!("Owner '{other}' does not look like an email"))
                                .for_entry(entry),
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Check for SyntaxCheck {
    fn name(&self) -> &'static str {
        "syntax"
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        cancel.check()?;

        let mut output = CheckOutput::new();

        for entry in input.entries.iter() {
            cancel.check()?;
            trace!("Checking syntax of line {}", entry.line_number);
            self.check_entry(entry, &mut output);
        }

        Ok(output)
    }
}
