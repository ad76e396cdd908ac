//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use docscope_core::{BuildConfig, BuildReport, CopyOutcome, FilterPolicy, ProgressReporter, run_build};
use docscope_shared::{ProjectConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docscope: publish audience- and visibility-scoped copies of a docs tree.
#[derive(Parser)]
#[command(
    name = "docscope",
    version,
    about = "Filter an MDX documentation tree and its docs.json navigation into per-target builds.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Documentation root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output base directory (defaults to <root>/build).
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Project config file (defaults to <root>/docscope.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build without pages marked internal (`internal: true` or `visibility: internal`).
    Visibility {
        /// Build target; names the output subdirectory (default: public).
        target: Option<String>,
    },

    /// Build for one audience, filtering pages and inline <audience> blocks.
    Audience {
        /// Audience identifier (default: dev).
        #[arg(env = "AUDIENCE")]
        target: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default docscope.toml into the documentation root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the progress log.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docscope=warn",
        1 => "docscope=info",
        2 => "docscope=debug",
        _ => "docscope=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let root = resolve_root(cli.root.as_deref())?;

    if let Command::Config {
        action: ConfigAction::Init,
    } = cli.command
    {
        return cmd_config_init(&root);
    }

    let project = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config(&root)?,
    };

    match cli.command {
        Command::Visibility { target } => {
            let target = resolve_target(FilterPolicy::Visibility, target, &project);
            cmd_build(&root, cli.out.as_deref(), &project, FilterPolicy::Visibility, target)
        }
        Command::Audience { target } => {
            let target = resolve_target(FilterPolicy::Audience, target, &project);
            cmd_build(&root, cli.out.as_deref(), &project, FilterPolicy::Audience, target)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&project),
        },
    }
}

fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    if !root.is_dir() {
        return Err(eyre!("documentation root '{}' is not a directory", root.display()));
    }
    std::fs::canonicalize(&root).wrap_err_with(|| format!("cannot resolve '{}'", root.display()))
}

/// Pick the build target: the command-line value (positional, or `AUDIENCE`
/// for the audience pipeline, already merged by clap) wins over the config
/// default, which itself defaults to `public` / `dev`.
fn resolve_target(policy: FilterPolicy, explicit: Option<String>, project: &ProjectConfig) -> String {
    explicit.unwrap_or_else(|| match policy {
        FilterPolicy::Visibility => project.defaults.visibility_target.clone(),
        FilterPolicy::Audience => project.defaults.audience_target.clone(),
    })
}

/// Make `--out` absolute and resolve symlinks in its longest existing prefix,
/// so it compares with the canonical source root.
fn resolve_out(out: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(out).wrap_err_with(|| format!("cannot resolve '{}'", out.display()))?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = std::fs::canonicalize(existing)
        .wrap_err_with(|| format!("cannot resolve '{}'", out.display()))?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(
    root: &Path,
    out: Option<&Path>,
    project: &ProjectConfig,
    policy: FilterPolicy,
    target: String,
) -> Result<()> {
    let mut config = BuildConfig::new(root, policy, target).with_project_config(project);
    if let Some(out) = out {
        config.output_root = resolve_out(out)?;
    }

    info!(policy = %policy, target = %config.target, "building filtered docs");
    println!(
        "Building filtered docs to {} (target: {}, policy: {policy})",
        config.output_dir().display(),
        config.target
    );

    let reporter = CliProgress::new();
    let report = run_build(&config, &reporter)?;

    print_summary(&report);
    println!("Filtered build complete");

    Ok(())
}

fn print_summary(report: &BuildReport) {
    let missing: Vec<&str> = report
        .assets
        .iter()
        .filter(|a| a.outcome == CopyOutcome::Missing)
        .map(|a| a.path.as_str())
        .collect();

    println!("  Pages:      {}/{} written", report.pages_written, report.pages_scanned);
    println!("  Nav pruned: {} entries", report.nav_pages_dropped);
    println!("  Assets:     {} files", report.asset_files_copied());
    if !missing.is_empty() {
        println!("  Skipped:    {} (not found)", missing.join(", "));
    }
    println!("  Time:       {:.2}s", report.elapsed.as_secs_f64());
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &ProjectConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_written(&self, route: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {route}"));
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
