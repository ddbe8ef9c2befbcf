//! Line scanner turning CODEOWNERS text into [`Entry`] records.

use super::entry::Entry;
use super::lexer::{is_blank_line, parse_comment_line, parse_tokens};
use log::trace;

/// Parses CODEOWNERS content into entries.
///
/// Blank lines and comment lines are skipped; every other line becomes one
/// entry whose first token is the pattern and whose remaining tokens are
/// the owners. Parsing never fails: malformed owners and missing owners are
/// left for the checks to report.
pub fn parse_entries(input: &str) -> Vec<Entry> {
    let mut entries = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_number = idx as u64 + 1;
        let line = raw.trim();

        if is_blank_line(line) || parse_comment_line(line).is_ok() {
            continue;
        }

        let Ok((_, tokens)) = parse_tokens(line) else {
            continue;
        };
        let mut tokens = tokens.into_iter();
        let Some(pattern) = tokens.next() else {
            continue;
        };

        let entry = Entry::new(line_number, pattern, tokens);
        trace!("line {}: {:?}", line_number, entry);
        entries.push(entry);
    }

    entries
}
