//! Pattern matching for CODEOWNERS files.
//!
//! [`ExistenceGlob`] expands a pattern into the globs searched by the
//! file-existence check, where an extension-less last segment may name
//! either a file or a directory.
//!
//! Rules:
//!
//! - `*` matches any sequence of non-slash characters
//! - `**` matches any sequence including slashes (any path)
//! - `/` at the start anchors to the repository root
//! - `/` at the end matches only directories
//! - Patterns without a slash match anywhere in the tree

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// The globs searched by the file-existence check for one pattern.
#[derive(Debug, Clone)]
pub struct ExistenceGlob {
    globs: Vec<String>,
    set: GlobSet,
}

impl ExistenceGlob {
    pub fn new(pattern: &str) -> Result<Self, globset::Error> {
        let globs = expand_for_existence(pattern);
        let mut builder = GlobSetBuilder::new();
        for glob in &globs {
            builder.add(build_glob(glob)?);
        }

        Ok(Self {
            set: builder.build()?,
            globs,
        })
    }

    /// The expanded glob strings, relative to the repository root.
    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    /// Checks a repository-relative file path against every expanded glob.
    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

/// Expands a CODEOWNERS pattern into root-relative globs.
///
/// A `!` prefix is kept verbatim, so negated patterns only match files whose
/// name literally starts with `!`.
pub fn expand_for_existence(pattern: &str) -> Vec<String> {
    let (anchored, body) = match pattern.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (directory_only, body) = match body.strip_suffix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let leading_single_star = body.starts_with('*') && !body.starts_with("**");
    let rooted = if !anchored && (leading_single_star || !body.contains('/')) {
        format!("**/{body}")
    } else {
        body.to_string()
    };

    if directory_only {
        return vec![format!("{rooted}/**")];
    }

    let last_segment = rooted.rsplit('/').next().unwrap_or_default();
    if !last_segment.contains('.') && !last_segment.contains("**") {
        vec![rooted.clone(), format!("{rooted}/**")]
    } else {
        vec![rooted]
    }
}

fn build_glob(pattern: &str) -> Result<Glob, globset::Error> {
    // `*` must not cross directory boundaries.
    GlobBuilder::new(pattern).literal_separator(true).build()
}
