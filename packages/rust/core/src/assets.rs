//! Best-effort copying of shared assets into a build output.
//!
//! A missing asset is an expected outcome ([`CopyOutcome::Missing`]), not an
//! error. Any other I/O failure aborts the run.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, instrument};
use walkdir::WalkDir;

use docscope_shared::{AssetsConfig, CONTENT_EXTENSION, DocscopeError, Result};

/// What happened to one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The asset existed; `files` files were copied.
    Copied { files: usize },
    /// The asset does not exist in the source tree.
    Missing,
}

/// Outcome for a named asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCopy {
    /// Asset path relative to the source root.
    pub path: String,
    pub outcome: CopyOutcome,
}

/// Asset folders and files copied into every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSet {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

impl Default for AssetSet {
    fn default() -> Self {
        Self::from(&AssetsConfig::default())
    }
}

impl From<&AssetsConfig> for AssetSet {
    fn from(config: &AssetsConfig) -> Self {
        Self {
            folders: config.folders.clone(),
            files: config.files.clone(),
        }
    }
}

/// Copy every folder then every file in `assets` from `source_root` to
/// `out_dir`, preserving relative paths.
#[instrument(skip_all, fields(folders = assets.folders.len(), files = assets.files.len()))]
pub fn copy_assets(source_root: &Path, out_dir: &Path, assets: &AssetSet) -> Result<Vec<AssetCopy>> {
    let mut copies = Vec::with_capacity(assets.folders.len() + assets.files.len());

    for folder in &assets.folders {
        let outcome = copy_asset_folder(source_root, out_dir, folder)?;
        copies.push(AssetCopy {
            path: folder.clone(),
            outcome,
        });
    }
    for file in &assets.files {
        let outcome = copy_asset_file(source_root, out_dir, file)?;
        copies.push(AssetCopy {
            path: file.clone(),
            outcome,
        });
    }

    Ok(copies)
}

/// Recursively copy the folder `rel`. Content (`.mdx`) files are skipped:
/// those belong to the page pipeline and were already filtered.
pub fn copy_asset_folder(source_root: &Path, out_dir: &Path, rel: &str) -> Result<CopyOutcome> {
    let src = source_root.join(rel);
    if !src.is_dir() {
        debug!(folder = rel, "asset folder missing, skipping");
        return Ok(CopyOutcome::Missing);
    }

    let dest_root = out_dir.join(rel);
    let mut files = 0;
    for entry in WalkDir::new(&src).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| src.clone(), Path::to_path_buf);
            DocscopeError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() || is_content_file(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&src)
            .map_err(|e| DocscopeError::validation(format!("{e}: {}", entry.path().display())))?;
        copy_file(entry.path(), &dest_root.join(relative))?;
        files += 1;
    }

    debug!(folder = rel, files, "copied asset folder");
    Ok(CopyOutcome::Copied { files })
}

/// Copy the single file `rel`.
pub fn copy_asset_file(source_root: &Path, out_dir: &Path, rel: &str) -> Result<CopyOutcome> {
    let src = source_root.join(rel);
    match std::fs::metadata(&src) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            debug!(file = rel, "asset is not a regular file, skipping");
            return Ok(CopyOutcome::Missing);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(file = rel, "asset file missing, skipping");
            return Ok(CopyOutcome::Missing);
        }
        Err(e) => return Err(DocscopeError::io(&src, e)),
    }

    copy_file(&src, &out_dir.join(rel))?;
    debug!(file = rel, "copied asset file");
    Ok(CopyOutcome::Copied { files: 1 })
}

fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocscopeError::io(parent, e))?;
    }
    std::fs::copy(src, dest).map_err(|e| DocscopeError::io(src, e))?;
    Ok(())
}

fn is_content_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CONTENT_EXTENSION)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docscope-assets-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn folder_copy_recurses_and_skips_content_files() {
        let tmp = temp_dir();
        let src = tmp.join("src");
        let out = tmp.join("out");
        write(&src, "images/a.png", "png");
        write(&src, "images/dark/b.svg", "<svg/>");
        write(&src, "snippets/card.mdx", "mdx");
        write(&src, "snippets/data.json", "{}");

        assert_eq!(
            copy_asset_folder(&src, &out, "images").unwrap(),
            CopyOutcome::Copied { files: 2 }
        );
        assert_eq!(std::fs::read_to_string(out.join("images/dark/b.svg")).unwrap(), "<svg/>");

        assert_eq!(
            copy_asset_folder(&src, &out, "snippets").unwrap(),
            CopyOutcome::Copied { files: 1 }
        );
        assert!(out.join("snippets/data.json").exists());
        assert!(!out.join("snippets/card.mdx").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_assets_are_reported_not_errors() {
        let tmp = temp_dir();
        let out = tmp.join("out");

        assert_eq!(copy_asset_folder(&tmp, &out, "logo").unwrap(), CopyOutcome::Missing);
        assert_eq!(copy_asset_file(&tmp, &out, "favicon.svg").unwrap(), CopyOutcome::Missing);
        assert!(!out.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn nested_file_creates_intermediate_dirs() {
        let tmp = temp_dir();
        let src = tmp.join("src");
        let out = tmp.join("out");
        write(&src, "api-reference/openapi.json", "{\"openapi\":\"3.1.0\"}");

        assert_eq!(
            copy_asset_file(&src, &out, "api-reference/openapi.json").unwrap(),
            CopyOutcome::Copied { files: 1 }
        );
        assert_eq!(
            std::fs::read_to_string(out.join("api-reference/openapi.json")).unwrap(),
            "{\"openapi\":\"3.1.0\"}"
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn copy_assets_reports_each_entry() {
        let tmp = temp_dir();
        let src = tmp.join("src");
        let out = tmp.join("out");
        write(&src, "logo/light.svg", "l");
        write(&src, "styles.css", "body{}");

        let copies = copy_assets(&src, &out, &AssetSet::default()).unwrap();
        let outcome = |p: &str| copies.iter().find(|c| c.path == p).unwrap().outcome;

        assert_eq!(copies.len(), 6);
        assert_eq!(outcome("images"), CopyOutcome::Missing);
        assert_eq!(outcome("logo"), CopyOutcome::Copied { files: 1 });
        assert_eq!(outcome("styles.css"), CopyOutcome::Copied { files: 1 });
        assert_eq!(outcome("favicon.svg"), CopyOutcome::Missing);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
