//! Validation of parsed CODEOWNERS entries.
//!
//! Checks implement [`checks::Check`] and report [`Issue`]s; the
//! [`CheckRunner`] runs them concurrently and decides whether the run passed.
//!
//! # Example
//!
//! ```rust
//! use codeowners_lint_core::parse::parse_entries;
//! use codeowners_lint_core::validate::checks::{Check, CheckInput, DupPatternsCheck};
//! use codeowners_lint_core::validate::CancellationToken;
//!
//! let entries = parse_entries("*.rs @rustacean\n*.rs @crab\n");
//! let input = CheckInput::new("/repo", entries);
//!
//! let output = tokio_test::block_on(
//!     DupPatternsCheck::new().check(&input, &CancellationToken::new()),
//! )
//! .unwrap();
//! assert_eq!(output.issues.len(), 1);
//! ```

mod cancel;
pub mod checks;
mod error;
pub mod file_walker;
pub mod git;
pub mod github_client;
mod issue;
pub mod runner;
pub mod syntax;

pub use cancel::CancellationToken;
pub use error::{CheckError, ConfigError};
pub use issue::{CheckOutput, Issue, ParseSeverityError, Severity};
pub use runner::{CheckReport, CheckRunner, Printer, RunOutcome, RunSummary};
