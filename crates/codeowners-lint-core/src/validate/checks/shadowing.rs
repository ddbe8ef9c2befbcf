//! Pattern shadowing detection check.

use super::{Check, CheckInput};
use crate::parse::Entry;
use crate::validate::{CancellationToken, CheckError, CheckOutput, Issue};
use async_trait::async_trait;
use log::debug;
use regex::Regex;

/// A check that detects patterns hidden by a later, broader pattern.
///
/// GitHub applies the last matching pattern, so a broad pattern placed after
/// a narrow one silently takes over every path the narrow one owned:
///
/// ```text
/// /build/logs/ @doctocat   # never applies
/// *            @everyone
/// ```
///
/// Each pattern is turned into an anchored regex (`*` becomes `.*`, the rest
/// is escaped) and tested against every earlier pattern. Both sides get a
/// trailing `/` first, so `/script` and `/script/` compare equal.
#[derive(Debug, Clone, Default)]
pub struct AvoidShadowingCheck;

impl AvoidShadowingCheck {
    /// Creates a new shadowing detection check.
    pub fn new() -> Self {
        Self
    }

    fn compile(pattern: &str) -> Result<Regex, CheckError> {
        let escaped = end_with_slash(pattern)
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        Regex::new(&format!("^{escaped}$")).map_err(|source| CheckError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
    }

    fn format_shadowed(entries: &[&Entry]) -> String {
        entries
            .iter()
            .map(|entry| format!("            * {}: {:?}", entry.line_number, entry.pattern))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn end_with_slash(pattern: &str) -> String {
    if pattern.ends_with('/') {
        pattern.to_string()
    } else {
        format!("{pattern}/")
    }
}

#[async_trait]
impl Check for AvoidShadowingCheck {
    fn name(&self) -> &'static str {
        "avoid-shadowing"
    }

    async fn check(
        &self,
        input: &CheckInput,
        cancel: &CancellationToken,
    ) -> Result<CheckOutput, CheckError> {
        cancel.check()?;

        let mut output = CheckOutput::new();
        let mut previous: Vec<(&Entry, String)> = Vec::with_capacity(input.entries.len());

        for entry in input.entries.iter() {
            cancel.check()?;
            let regex = Self::compile(&entry.pattern)?;

            let shadowed: Vec<&Entry> = previous
                .iter()
                .filter(|(_, normalized)| regex.is_match(normalized))
                .map(|(earlier, _)| *earlier)
                .collect();

            if !shadowed.is_empty() {
                debug!(
                    "Pattern {:?} on line {} shadows {} earlier pattern(s)",
                    entry.pattern,
                    entry.line_number,
                    shadowed.len()
                );
                output.report(
                    Issue::error(format!(
                        "Pattern {:?} shadows the following patterns:\n{}\n\
                         Entries should go from least-specific to most-specific.",
                        entry.pattern,
                        Self::format_shadowed(&shadowed)
                    ))
                    .for_entry(entry),
                );
            }

            previous.push((entry, end_with_slash(&entry.pattern)));
        }

        Ok(output)
    }
}
