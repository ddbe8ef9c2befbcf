//! Parser module for CODEOWNERS files.
//!
//! # Example
//!
//! ```rust
//! use codeowners_lint_core::parse::parse_entries;
//!
//! let input = r#"
//! ## CODEOWNERS file
//! *.rs @rustacean
//! /docs/ @github/docs-team
//! "#;
//!
//! let entries = parse_entries(input);
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].line_number, 3);
//! ```

mod entry;
mod lexer;
mod parser;

pub use entry::Entry;
pub use lexer::{is_blank_line, parse_comment_line, parse_tokens};
pub use parser::parse_entries;
