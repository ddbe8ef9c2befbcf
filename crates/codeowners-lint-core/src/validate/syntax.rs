//! Owner token grammar shared by the syntax and owners checks.
//!
//! GitHub handles are `@name` or `@org/team`. Each segment is 1 to 39 ASCII
//! alphanumerics or hyphens and cannot start or end with a hyphen; team
//! segments may also contain underscores. Emails are only checked for the
//! coarse `x@y.z` shape.

/// Longest GitHub login or team slug segment.
pub const MAX_SEGMENT_LEN: usize = 39;

/// Owner that is skipped by default: GitHub's placeholder for deleted users.
pub const GHOST_OWNER: &str = "@ghost";

/// Classification of an owner token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind<'a> {
    /// `@name`, with the leading `@` stripped.
    User { name: &'a str },
    /// `@org/team`, with the leading `@` stripped.
    Team { org: &'a str, team: &'a str },
    Email,
    Invalid,
}

impl<'a> OwnerKind<'a> {
    /// Classifies a token by its prefix and separators.
    ///
    /// Exactly one variant applies to every string. A user is `@` with no
    /// `/`; a team has exactly one `/` and a non-empty segment after it.
    /// Segments may still be empty (`@`, `@/team`); [`is_valid_handle`]
    /// checks the full grammar.
    pub fn classify(owner: &'a str) -> Self {
        if let Some(handle) = owner.strip_prefix('@') {
            return match handle.split_once('/') {
                None => OwnerKind::User { name: handle },
                Some((org, team)) if !team.is_empty() && !team.contains('/') => {
                    OwnerKind::Team { org, team }
                }
                _ => OwnerKind::Invalid,
            };
        }

        if looks_like_email(owner) {
            OwnerKind::Email
        } else {
            OwnerKind::Invalid
        }
    }

    pub fn is_team(&self) -> bool {
        matches!(self, OwnerKind::Team { .. })
    }
}

/// Returns true if `owner` is a syntactically valid `@name` or `@org/team`.
pub fn is_valid_handle(owner: &str) -> bool {
    let Some(handle) = owner.strip_prefix('@') else {
        return false;
    };

    match handle.split_once('/') {
        None => is_valid_segment(handle, false),
        Some((org, team)) => is_valid_segment(org, false) && is_valid_segment(team, true),
    }
}

fn is_valid_segment(segment: &str, allow_underscore: bool) -> bool {
    let bytes = segment.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    bytes.len() <= MAX_SEGMENT_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'-' || (allow_underscore && b == b'_'))
}

/// Returns true if `owner` has the `x@y.z` shape: an `@` with something
/// before it, followed later by a `.` that has something on both sides.
pub fn looks_like_email(owner: &str) -> bool {
    owner.match_indices('@').any(|(at, _)| {
        if at == 0 {
            return false;
        }
        let domain = &owner[at + 1..];
        domain
            .match_indices('.')
            .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
    })
}
