//! The issue vocabulary every check reports into.

use crate::parse::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The severity of a reported issue.
///
/// Variants are ordered from most to least severe, so `Error < Warning`.
/// A run fails when the most severe issue it saw is `<=` the configured
/// threshold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A problem that makes the CODEOWNERS file wrong.
    #[default]
    Error = 1,
    /// Something suspicious that GitHub may still accept.
    Warning = 2,
}

impl Severity {
    /// The three-letter tag used in terminal output.
    pub fn short_tag(&self) -> &'static str {
        match self {
            Severity::Error => "err",
            Severity::Warning => "war",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Returned when a severity name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}', expected 'error' or 'warning'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "err" => Ok(Severity::Error),
            "warning" | "warn" | "war" => Ok(Severity::Warning),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    /// Absent for issues that span several lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    pub message: String,
}

impl Issue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            line: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Attaches a line number.
    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches the line of the given entry.
    pub fn for_entry(self, entry: &Entry) -> Self {
        self.at_line(entry.line_number)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity.short_tag())?;
        if let Some(line) = self.line {
            write!(f, " line {line}:")?;
        }
        write!(f, " {}", self.message)
    }
}

/// The issues produced by one check invocation, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckOutput {
    pub issues: Vec<Issue>,
}

impl CheckOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an issue.
    pub fn report(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Returns true if nothing was reported.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the most severe issue severity, if any.
    pub fn most_severe(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).min()
    }

    /// Re-tags every issue with the given severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        for issue in &mut self.issues {
            issue.severity = severity;
        }
        self
    }
}
