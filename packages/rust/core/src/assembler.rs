//! Output writer.
//!
//! Materializes a build under `<output_root>/<target>/`:
//! ```text
//! <output_root>/<target>/
//! ├── docs.json          (pruned manifest)
//! ├── index.mdx
//! ├── guides/
//! │   └── setup.mdx
//! ├── images/ logo/ snippets/ ...   (copied assets)
//! └── favicon.svg ...
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use docscope_shared::{DocscopeError, Result};

use crate::navigation::NavigationManifest;

/// Remove `out_dir` entirely and recreate it empty.
///
/// Refuses to clear a directory that is, or contains, `source_root`.
#[instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn prepare_output_dir(out_dir: &Path, source_root: &Path) -> Result<()> {
    if source_root.starts_with(out_dir) {
        return Err(DocscopeError::validation(format!(
            "refusing to clear {}: it contains the source tree {}",
            out_dir.display(),
            source_root.display()
        )));
    }

    match std::fs::remove_dir_all(out_dir) {
        Ok(()) => debug!("removed previous output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(DocscopeError::io(out_dir, e)),
    }
    std::fs::create_dir_all(out_dir).map_err(|e| DocscopeError::io(out_dir, e))?;

    info!("output directory ready");
    Ok(())
}

/// Write a content file at `relative` under `out_dir`, creating parent directories.
pub fn write_page(out_dir: &Path, relative: &Path, contents: &str) -> Result<PathBuf> {
    let file_path = out_dir.join(relative);

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocscopeError::io(parent, e))?;
    }

    std::fs::write(&file_path, contents).map_err(|e| DocscopeError::io(&file_path, e))?;

    debug!(path = %file_path.display(), "wrote page");
    Ok(file_path)
}

/// Write the manifest as pretty-printed JSON to `out_dir/file_name`.
pub fn write_manifest(
    out_dir: &Path,
    file_name: &str,
    manifest: &NavigationManifest,
) -> Result<PathBuf> {
    let path = out_dir.join(file_name);
    let json = manifest.to_pretty_json()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocscopeError::io(parent, e))?;
    }
    std::fs::write(&path, json).map_err(|e| DocscopeError::io(&path, e))?;

    debug!(path = %path.display(), "wrote manifest");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
