//! Duplicate pattern detection check.

use super::{Check, CheckInput};
use crate::parse::Entry;
use crate::validate::{CancellationToken, CheckError, CheckOutput, Issue};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;

/// A check that detects duplicate patterns in CODEOWNERS files.
///
/// Every pattern defined more than once yields a single error listing all of
/// its occurrences. Patterns are compared verbatim, so `/src/` and `src/`
/// are different patterns.
#[derive(Debug, Clone, Default)]
pub struct DupPatternsCheck;

impl DupPatternsCheck {
    /// Creates a new duplicate patterns check.
    pub fn new() -> Self {
        Self
    }

    fn format_occurrences(entries: &[&Entry]) -> String {
        entries
            .iter()
            .map(|entry| {
                format!(
                    "            * {}: with owners: [{}]",
                    entry.line_number,
                    entry.owners.join(" ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Check for DupPatternsCheck {
    fn name(&self) -> &'static str {
        "duppatterns"
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        cancel.check()?;

        let mut by_pattern: IndexMap<&str, Vec<&Entry>> = IndexMap::new();
        for entry in input.entries.iter() {
            cancel.check()?;
            by_pattern
                .entry(entry.pattern.as_str())
                .or_default()
                .push(entry);
        }

        let mut output = CheckOutput::new();
        for (pattern, entries) in by_pattern.iter().filter(|(_, e)| e.len() > 1) {
            cancel.check()?;
            debug!("Pattern {:?} defined {} times", pattern, entries.len());
            output.report(Issue::error(format!(
                "Pattern {:?} is defined {} times in lines: \n{}",
                pattern,
                entries.len(),
                Self::format_occurrences(entries)
            )));
        }

        Ok(output)
    }
}
