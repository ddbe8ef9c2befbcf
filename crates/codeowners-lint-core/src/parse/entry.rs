//! The ownership rule record shared by every checker.

use serde::Serialize;
use std::fmt;

/// One ownership rule: a path pattern, its owners and the line it came from.
///
/// Line numbers are 1-based. Line 0 is only used by synthetic entries built
/// in code and never by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
    /// 1-based line number in the CODEOWNERS file.
    pub line_number: u64,
    /// The path pattern, verbatim.
    pub pattern: String,
    /// Owner tokens in declaration order.
    pub owners: Vec<String>,
}

impl Entry {
    /// Creates an entry from its parts.
    pub fn new<P, I, O>(line_number: u64, pattern: P, owners: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        Self {
            line_number,
            pattern: pattern.into(),
            owners: owners.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the entry declares no owners.
    pub fn is_unowned(&self) -> bool {
        self.owners.is_empty()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)?;
        for owner in &self.owners {
            write!(f, " {owner}")?;
        }
        Ok(())
    }
}
