//! Token parsers for CODEOWNERS lines.

use nom::{
    IResult, Parser,
    bytes::complete::take_till1,
    character::complete::{char, multispace0, space0},
    combinator::rest,
    multi::many0,
    sequence::preceded,
};

/// Parses a complete comment line (optional whitespace + # + content).
pub fn parse_comment_line(input: &str) -> IResult<&str, &str> {
    (space0, char('#'), rest)
        .map(|(_, _, content)| content)
        .parse(input)
}

/// Checks if a line is blank (empty or only whitespace).
pub fn is_blank_line(input: &str) -> bool {
    input.trim().is_empty()
}

/// Splits a rule line into whitespace-separated tokens.
///
/// `#` carries no meaning here: an inline comment comes back as ordinary
/// tokens so that the syntax check can report it.
pub fn parse_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    many0(preceded(multispace0, take_till1(char::is_whitespace))).parse(input)
}
