//! End-to-end build pipeline: scan → filter → write pages → prune navigation → copy assets.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use docscope_markdown::{parse_document, rewrite_body};
use docscope_shared::{DEFAULT_MANIFEST_FILE, DocscopeError, ProjectConfig, Result};

use crate::assembler;
use crate::assets::{self, AssetCopy, AssetSet, CopyOutcome};
use crate::filter::{AllowedSet, FilterPolicy};
use crate::navigation::NavigationManifest;
use crate::scan::{self, SourceFile};

/// Configuration for one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the documentation tree.
    pub source_root: PathBuf,
    /// Output base; the build lands in `<output_root>/<target>`.
    pub output_root: PathBuf,
    /// Build target identifier.
    pub target: String,
    /// Filtering predicate (and whether bodies are rewritten).
    pub policy: FilterPolicy,
    /// Manifest file name relative to `source_root`.
    pub manifest_file: String,
    /// Assets copied after the pages.
    pub assets: AssetSet,
}

impl BuildConfig {
    /// Defaults: output under `<source_root>/build`, `docs.json`, default assets.
    pub fn new(source_root: impl Into<PathBuf>, policy: FilterPolicy, target: impl Into<String>) -> Self {
        let source_root = source_root.into();
        Self {
            output_root: source_root.join("build"),
            source_root,
            target: target.into(),
            policy,
            manifest_file: DEFAULT_MANIFEST_FILE.into(),
            assets: AssetSet::default(),
        }
    }

    /// Apply a project config: output base, manifest name, and asset set.
    pub fn with_project_config(mut self, config: &ProjectConfig) -> Self {
        self.output_root = self.source_root.join(&config.defaults.output_dir);
        self.manifest_file = config.defaults.manifest.clone();
        self.assets = AssetSet::from(&config.assets);
        self
    }

    /// Destination directory of this build.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.target)
    }

    fn validate(&self) -> Result<()> {
        let t = self.target.as_str();
        if t.is_empty() || t == "." || t == ".." || t.contains(['/', '\\']) {
            return Err(DocscopeError::validation(format!(
                "invalid build target '{t}': must be a single path segment"
            )));
        }
        Ok(())
    }
}

/// Result of a build run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Directory the build was written to.
    pub output_dir: PathBuf,
    pub target: String,
    pub policy: FilterPolicy,
    /// Content files found by the scanner.
    pub pages_scanned: usize,
    /// Content files written to the output.
    pub pages_written: usize,
    /// Routes that passed the filter.
    pub allowed: AllowedSet,
    /// Navigation page entries removed by pruning.
    pub nav_pages_dropped: usize,
    pub assets: Vec<AssetCopy>,
    pub elapsed: Duration,
}

impl BuildReport {
    /// Number of asset files copied across all assets.
    pub fn asset_files_copied(&self) -> usize {
        self.assets
            .iter()
            .map(|a| match a.outcome {
                CopyOutcome::Copied { files } => files,
                CopyOutcome::Missing => 0,
            })
            .sum()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page is written.
    fn page_written(&self, route: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_written(&self, _route: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &BuildReport) {}
}

/// A content file that passed the filter, with its raw text.
struct IncludedPage {
    file: SourceFile,
    raw: String,
}

/// Run a full filtered build.
///
/// 1. Load the navigation manifest (fails before anything is deleted)
/// 2. Scan the tree and decide every page, producing the allowed set
/// 3. Clear the output directory
/// 4. Write included pages, rewritten when the policy asks for it
/// 5. Prune and write the manifest
/// 6. Copy shared assets
#[instrument(skip_all, fields(target = %config.target, policy = %config.policy))]
pub fn run_build(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<BuildReport> {
    let start = Instant::now();
    config.validate()?;
    let out_dir = config.output_dir();

    info!(
        root = %config.source_root.display(),
        out = %out_dir.display(),
        "starting filtered build"
    );

    // --- Phase 1: Manifest ---
    progress.phase("Loading navigation manifest");
    let manifest = NavigationManifest::load(&config.source_root.join(&config.manifest_file))?;

    // --- Phase 2: Scan + filter ---
    progress.phase("Scanning content files");
    let skip = scan_skip_dirs(&config.source_root, &config.output_root, &out_dir);
    let files = scan::scan_content_files(&config.source_root, &skip)?;
    let pages_scanned = files.len();

    progress.phase("Filtering pages");
    let (included, allowed) = filter_pages(files, config)?;
    info!(
        scanned = pages_scanned,
        included = included.len(),
        "page filter complete"
    );

    // --- Phase 3: Output directory ---
    progress.phase("Preparing output directory");
    assembler::prepare_output_dir(&out_dir, &config.source_root)?;

    // --- Phase 4: Pages ---
    progress.phase("Writing pages");
    let total = included.len();
    for (i, page) in included.iter().enumerate() {
        let contents = render_page(page, config);
        assembler::write_page(&out_dir, &page.file.relative, &contents)?;
        progress.page_written(page.file.route.as_str(), i + 1, total);
    }

    // --- Phase 5: Navigation ---
    progress.phase("Pruning navigation");
    let pruned = manifest.prune(&allowed);
    assembler::write_manifest(&out_dir, &config.manifest_file, &pruned.manifest)?;

    // --- Phase 6: Assets ---
    progress.phase("Copying assets");
    let asset_copies = assets::copy_assets(&config.source_root, &out_dir, &config.assets)?;

    let report = BuildReport {
        output_dir: out_dir,
        target: config.target.clone(),
        policy: config.policy,
        pages_scanned,
        pages_written: total,
        allowed,
        nav_pages_dropped: pruned.dropped_pages,
        assets: asset_copies,
        elapsed: start.elapsed(),
    };

    info!(
        pages = report.pages_written,
        nav_dropped = report.nav_pages_dropped,
        assets = report.asset_files_copied(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "filtered build complete"
    );
    progress.done(&report);

    Ok(report)
}

/// Read every scanned file and apply the policy. Returns included pages in
/// scan order plus the allowed route set.
fn filter_pages(files: Vec<SourceFile>, config: &BuildConfig) -> Result<(Vec<IncludedPage>, AllowedSet)> {
    let mut included = Vec::new();
    let mut allowed = AllowedSet::new();

    for file in files {
        let raw = std::fs::read_to_string(&file.path).map_err(|e| DocscopeError::io(&file.path, e))?;
        let doc = parse_document(&raw);

        if !config.policy.includes(&doc.front_matter, &config.target) {
            debug!(route = %file.route, "excluded");
            continue;
        }

        debug!(route = %file.route, "included");
        if !allowed.insert(file.route.clone()) {
            warn!(
                route = %file.route,
                path = %file.relative.display(),
                "route collision: another file already maps to this route"
            );
        }
        included.push(IncludedPage { file, raw });
    }

    Ok((included, allowed))
}

/// Final contents of an included page. The metadata block is kept verbatim.
fn render_page(page: &IncludedPage, config: &BuildConfig) -> String {
    if !config.policy.rewrites_content() {
        return page.raw.clone();
    }

    let doc = parse_document(&page.raw);
    let body = rewrite_body(doc.body, &page.file.relative_str(), &config.target);
    format!("{}{body}", doc.header)
}

/// Output locations inside the tree are never scanned: the build directory
/// itself, and the output base when it sits below the source root.
fn scan_skip_dirs(source_root: &Path, output_root: &Path, out_dir: &Path) -> Vec<PathBuf> {
    let inside = |dir: &Path| dir != source_root && dir.starts_with(source_root);

    let mut skip = Vec::new();
    if inside(out_dir) {
        skip.push(out_dir.to_path_buf());
    }
    if inside(output_root) && output_root != out_dir {
        skip.push(output_root.to_path_buf());
    }
    skip
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use walkdir::WalkDir;

    const MANIFEST: &str = r#"{
  "name": "Docs",
  "navigation": {
    "tabs": [
      {
        "tab": "Guides",
        "groups": [
          { "group": "Start", "pages": ["index", "guides/setup", "guides/missing"] },
          { "group": "Internal", "pages": ["guides/ops"] }
        ]
      },
      {
        "tab": "Product",
        "groups": [
          { "group": "Planning", "pages": ["product/roadmap"] }
        ]
      }
    ]
  }
}"#;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docscope-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn make_tree() -> PathBuf {
        let root = temp_dir();
        write(&root, "docs.json", MANIFEST);
        write(&root, "index.mdx", "# Welcome\n");
        write(
            &root,
            "guides/setup.mdx",
            "---\ntitle: Setup\n---\nimport Y from '/reference/y.mdx'\nimport X from '/snippets/x.mdx'\n\n<audience data-audience=\"dev, pm\">shared</audience>\n<audience data-audience=\"pm\">pm only</audience>\n",
        );
        write(&root, "guides/ops.mdx", "---\nvisibility: internal\naudience: [dev]\n---\nops\n");
        write(&root, "product/roadmap.mdx", "---\naudience: [pm]\ninternal: true\n---\nroadmap\n");
        write(&root, "snippets/x.mdx", "snippet\n");
        write(&root, "snippets/data.json", "{}");
        write(&root, "images/a.png", "png");
        write(&root, "favicon.svg", "<svg/>");
        write(&root, "node_modules/pkg/readme.mdx", "dependency\n");
        root
    }

    /// Every file under `dir` keyed by relative path.
    fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .map(std::result::Result::unwrap)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/");
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect()
    }

    fn read_manifest(out: &Path) -> NavigationManifest {
        NavigationManifest::load(&out.join("docs.json")).unwrap()
    }

    #[test]
    fn visibility_build_drops_internal_pages() {
        let root = make_tree();
        let config = BuildConfig::new(&root, FilterPolicy::Visibility, "public");

        let report = run_build(&config, &SilentProgress).unwrap();
        let out = root.join("build/public");
        assert_eq!(report.output_dir, out);

        let routes: Vec<&str> = report.allowed.iter().map(|r| r.as_str()).collect();
        assert_eq!(routes, vec!["guides/setup", "index", "snippets/x"]);
        assert_eq!(report.pages_scanned, 5);
        assert_eq!(report.pages_written, 3);

        // Pages are copied verbatim in this pipeline
        assert_eq!(
            std::fs::read_to_string(out.join("guides/setup.mdx")).unwrap(),
            std::fs::read_to_string(root.join("guides/setup.mdx")).unwrap()
        );
        assert!(!out.join("guides/ops.mdx").exists());
        assert!(!out.join("node_modules").exists());

        let nav = read_manifest(&out);
        assert_eq!(nav.page_routes(), vec!["index", "guides/setup"]);
        assert_eq!(report.nav_pages_dropped, 3);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn audience_build_filters_and_rewrites() {
        let root = make_tree();
        let config = BuildConfig::new(&root, FilterPolicy::Audience, "dev");

        let report = run_build(&config, &SilentProgress).unwrap();
        let out = root.join("build/dev");

        let routes: Vec<&str> = report.allowed.iter().map(|r| r.as_str()).collect();
        assert_eq!(routes, vec!["guides/ops", "guides/setup", "index", "snippets/x"]);

        assert_eq!(
            std::fs::read_to_string(out.join("guides/setup.mdx")).unwrap(),
            "---\ntitle: Setup\n---\nimport Y from '../reference/y.mdx'\nimport X from '/snippets/x.mdx'\n\nshared\n\n"
        );
        assert!(!out.join("product/roadmap.mdx").exists());

        let nav = read_manifest(&out);
        assert_eq!(nav.page_routes(), vec!["index", "guides/setup", "guides/ops"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn output_tree_matches_allowed_set() {
        let root = make_tree();
        for (policy, target) in [(FilterPolicy::Audience, "pm"), (FilterPolicy::Visibility, "public")] {
            let report = run_build(&BuildConfig::new(&root, policy, target), &SilentProgress).unwrap();

            let written: Vec<String> = snapshot(&report.output_dir)
                .into_keys()
                .filter_map(|k| k.strip_suffix(".mdx").map(str::to_string))
                .collect();
            let allowed: Vec<String> = report.allowed.iter().map(|r| r.to_string()).collect();
            assert_eq!(written, allowed);
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn assets_are_copied_and_missing_ones_reported() {
        let root = make_tree();
        let report = run_build(&BuildConfig::new(&root, FilterPolicy::Audience, "pm"), &SilentProgress).unwrap();
        let out = &report.output_dir;

        assert!(out.join("images/a.png").exists());
        assert!(out.join("snippets/data.json").exists());
        assert!(out.join("favicon.svg").exists());
        assert!(!out.join("styles.css").exists());

        let logo = report.assets.iter().find(|a| a.path == "logo").unwrap();
        assert_eq!(logo.outcome, CopyOutcome::Missing);
        assert_eq!(report.asset_files_copied(), 3);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn repeated_builds_are_byte_identical() {
        let root = make_tree();
        let config = BuildConfig::new(&root, FilterPolicy::Audience, "pm");

        run_build(&config, &SilentProgress).unwrap();
        let first = snapshot(&config.output_dir());
        // Stale output must not survive a rebuild
        write(&config.output_dir(), "stale.mdx", "old");
        run_build(&config, &SilentProgress).unwrap();
        let second = snapshot(&config.output_dir());

        assert_eq!(first, second);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_manifest_aborts_before_clearing_output() {
        let root = make_tree();
        let config = BuildConfig::new(&root, FilterPolicy::Visibility, "public");
        run_build(&config, &SilentProgress).unwrap();

        std::fs::remove_file(root.join("docs.json")).unwrap();
        let err = run_build(&config, &SilentProgress).unwrap_err();
        assert!(err.is_not_found());
        assert!(config.output_dir().join("index.mdx").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn unparsable_manifest_is_an_error() {
        let root = make_tree();
        write(&root, "docs.json", "{ broken");
        let err = run_build(&BuildConfig::new(&root, FilterPolicy::Audience, "dev"), &SilentProgress)
            .unwrap_err();
        assert!(err.to_string().starts_with("manifest error:"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn custom_output_root_inside_tree_is_not_rescanned() {
        let root = make_tree();
        let mut config = BuildConfig::new(&root, FilterPolicy::Audience, "dev");
        config.output_root = root.join("dist");

        let first = run_build(&config, &SilentProgress).unwrap();
        let second = run_build(&config, &SilentProgress).unwrap();
        assert_eq!(first.pages_scanned, second.pages_scanned);
        assert!(second.allowed.iter().all(|r| !r.as_str().starts_with("dist/")));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn output_root_equal_to_source_root_is_not_rescanned() {
        let root = make_tree();
        let mut config = BuildConfig::new(&root, FilterPolicy::Audience, "pm");
        config.output_root = root.clone();

        let first = run_build(&config, &SilentProgress).unwrap();
        let snapshot_first = snapshot(&config.output_dir());
        let second = run_build(&config, &SilentProgress).unwrap();
        let third = run_build(&config, &SilentProgress).unwrap();

        assert_eq!(first.allowed, second.allowed);
        assert_eq!(second.allowed, third.allowed);
        assert!(third.allowed.iter().all(|r| !r.as_str().starts_with("pm/")));
        assert_eq!(snapshot(&config.output_dir()), snapshot_first);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn skip_dirs_cover_build_dir_and_nested_base() {
        let root = Path::new("/docs");
        assert_eq!(
            scan_skip_dirs(root, root, &root.join("dev")),
            vec![root.join("dev")]
        );
        assert_eq!(
            scan_skip_dirs(root, &root.join("out"), &root.join("out/dev")),
            vec![root.join("out/dev"), root.join("out")]
        );
        assert!(scan_skip_dirs(root, Path::new("/elsewhere"), Path::new("/elsewhere/dev")).is_empty());
    }

    #[test]
    fn invalid_targets_are_rejected() {
        let root = make_tree();
        for target in ["", ".", "..", "a/b", "a\\b"] {
            let config = BuildConfig::new(&root, FilterPolicy::Audience, target);
            assert!(run_build(&config, &SilentProgress).is_err(), "target {target:?}");
        }
        assert!(root.join("index.mdx").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn project_config_overrides_layout() {
        let root = make_tree();
        std::fs::rename(root.join("docs.json"), root.join("nav.json")).unwrap();

        let mut project = ProjectConfig::default();
        project.defaults.output_dir = "out".into();
        project.defaults.manifest = "nav.json".into();
        project.assets.folders = vec!["images".into()];
        project.assets.files = vec![];

        let config = BuildConfig::new(&root, FilterPolicy::Visibility, "public").with_project_config(&project);
        let report = run_build(&config, &SilentProgress).unwrap();

        assert_eq!(report.output_dir, root.join("out/public"));
        assert!(report.output_dir.join("nav.json").exists());
        assert_eq!(report.assets.len(), 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn colliding_routes_appear_once_in_allowed_set() {
        let root = make_tree();
        // On unix a backslash is an ordinary file-name character
        write(&root, "guides\\setup.mdx", "collides\n");

        let report = run_build(&BuildConfig::new(&root, FilterPolicy::Audience, "dev"), &SilentProgress).unwrap();
        let count = report.allowed.iter().filter(|r| r.as_str() == "guides/setup").count();
        assert_eq!(count, 1);
        assert_eq!(report.pages_written, report.allowed.len() + 1);

        let _ = std::fs::remove_dir_all(&root);
    }
}
