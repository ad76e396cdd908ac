//! Tree scanner: enumerate content files under a documentation root.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use docscope_shared::{CONTENT_EXTENSION, DocscopeError, EXCLUDED_DIRS, Result, Route};

/// A content file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path (root joined with `relative`).
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative: PathBuf,
    /// Route derived from `relative`.
    pub route: Route,
}

impl SourceFile {
    /// Relative path as a `/`-separated string.
    pub fn relative_str(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }
}

/// Recursively collect every `.mdx` file under `root`.
///
/// Directories named in [`EXCLUDED_DIRS`] are never entered, nor is any
/// directory listed in `skip` (compared by full path). Entries are visited in
/// file-name order so repeated scans of the same tree agree. Symlinks are
/// not followed.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan_content_files(root: &Path, skip: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry, skip));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            DocscopeError::io(path, e.into())
        })?;

        if !entry.file_type().is_file() || !has_content_extension(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| DocscopeError::validation(format!("{e}: {}", entry.path().display())))?
            .to_path_buf();
        let route = Route::from_relative_path(&relative);

        debug!(%route, "found content file");
        files.push(SourceFile {
            path: entry.into_path(),
            relative,
            route,
        });
    }

    debug!(count = files.len(), "scan complete");
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry, skip: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let excluded = entry
        .file_name()
        .to_str()
        .is_some_and(|name| EXCLUDED_DIRS.contains(&name));
    excluded || skip.iter().any(|s| s == entry.path())
}

fn has_content_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(&format!(".{CONTENT_EXTENSION}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
