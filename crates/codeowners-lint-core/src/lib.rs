//! CODEOWNERS Lint Core
//!
//! A library for validating GitHub CODEOWNERS files.
//!
//! # Features
//!
//! - **Parser**: Turn a CODEOWNERS file into ordered, line-numbered entries
//! - **Checks**: Syntax, duplicate patterns, file existence, owner lookups,
//!   unowned files and shadowed patterns
//! - **Runner**: Run checks concurrently, collect severity-tagged issues and
//!   derive a pass/fail outcome from a threshold
//!
//! # Quick Start
//!
//! ```rust
//! use codeowners_lint_core::parse::parse_entries;
//! use codeowners_lint_core::validate::checks::{CheckInput, SyntaxCheck};
//! use codeowners_lint_core::validate::{
//!     CancellationToken, CheckReport, CheckRunner, Printer, RunOutcome, RunSummary, Severity,
//! };
//! use std::sync::Arc;
//!
//! struct Quiet;
//!
//! impl Printer for Quiet {
//!     fn print_check_result(&mut self, report: &CheckReport) {
//!         println!("{}: failed={}", report.name, report.is_failure());
//!     }
//!     fn print_summary(&mut self, _summary: &RunSummary) {}
//!     fn print_interrupted(&mut self) {}
//! }
//!
//! let input = r#"
//! ## CODEOWNERS file
//! *.rs @rustacean
//! /docs/ @github/docs-team
//! "#;
//!
//! let runner = CheckRunner::new(vec![Arc::new(SyntaxCheck::new())], Severity::Warning);
//! let outcome = tokio_test::block_on(runner.run(
//!     CheckInput::new("/repo", parse_entries(input)),
//!     &CancellationToken::new(),
//!     &mut Quiet,
//! ));
//! assert_eq!(outcome, RunOutcome::Passed);
//! ```
//!
//! # Modules
//!
//! - [`parse`]: Parser for CODEOWNERS files
//! - [`validate`]: Checks, the runner and the issue model
//! - [`matching`]: Pattern matching for CODEOWNERS files

use std::path::{Path, PathBuf};

pub mod matching;
pub mod parse;
pub mod validate;

// Re-export commonly used types at the crate root
pub use parse::{Entry, parse_entries};
pub use validate::checks::{Check, CheckConfig, CheckInput, CheckName, build_checks};
pub use validate::{
    CancellationToken, CheckError, CheckOutput, CheckRunner, ConfigError, Issue, RunOutcome,
    Severity,
};

/// Finds the CODEOWNERS file in a repository.
///
/// Searches in the following locations (in order):
/// 1. `.github/CODEOWNERS`
/// 2. `CODEOWNERS`
/// 3. `docs/CODEOWNERS`
///
/// Returns `Some(path)` if found, `None` otherwise.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use codeowners_lint_core::find_codeowners_file;
///
/// let repo_path = Path::new("/path/to/repo");
/// if let Some(codeowners_path) = find_codeowners_file(repo_path) {
///     println!("Found CODEOWNERS at: {}", codeowners_path.display());
/// } else {
///     eprintln!("CODEOWNERS file not found");
/// }
/// ```
pub fn find_codeowners_file(repo_path: &Path) -> Option<PathBuf> {
    let locations = [
        repo_path.join(".github/CODEOWNERS"),
        repo_path.join("CODEOWNERS"),
        repo_path.join("docs/CODEOWNERS"),
    ];
    locations.into_iter().find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn github_directory_wins() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".github")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join(".github/CODEOWNERS"), "* @a\n").unwrap();
        fs::write(dir.path().join("docs/CODEOWNERS"), "* @b\n").unwrap();

        assert_eq!(
            find_codeowners_file(dir.path()),
            Some(dir.path().join(".github/CODEOWNERS"))
        );
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_codeowners_file(dir.path()), None);
    }
}
