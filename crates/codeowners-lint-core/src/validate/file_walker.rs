//! Repository file listing used by the file-existence check.

use crate::validate::{CancellationToken, CheckError};
use ignore::{DirEntry, WalkBuilder};
use log::{debug, trace};
use std::path::Path;

/// Name of the directory the walk never descends into.
const GIT_DIR: &str = ".git";

/// Lists every regular file under `repo_path`.
///
/// Hidden and gitignored files are included: a pattern that only matches an
/// ignored file still names a file that exists. The `.git` directory is never
/// entered and symlinks are not followed. Paths are relative to `repo_path`
/// and use forward slashes. Any walk error aborts the listing.
pub fn list_regular_files(
    repo_path: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<String>, CheckError> {
    debug!("Listing regular files in {:?}", repo_path);

    let walker = WalkBuilder::new(repo_path)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| entry.file_name() != GIT_DIR)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        cancel.check()?;
        let entry = entry?;
        if let Some(relative) = relative_file(repo_path, &entry) {
            files.push(relative);
        }
    }

    debug!("Found {} files", files.len());
    trace!("Files: {:?}", files);
    Ok(files)
}

/// The repository-relative path of `entry` if it is a regular file.
fn relative_file(repo_path: &Path, entry: &DirEntry) -> Option<String> {
    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
        return None;
    }

    let relative = entry.path().strip_prefix(repo_path).ok()?;
    let relative = relative.to_str()?;
    Some(relative.replace('\\', "/"))
}
