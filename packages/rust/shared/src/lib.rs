//! Shared types, error model, and configuration for docscope.
//!
//! This crate is the foundation depended on by all other docscope crates.
//! It provides:
//! - [`DocscopeError`]: the unified error type
//! - Domain types ([`Route`], [`FrontMatter`], [`FrontMatterValue`])
//! - Configuration ([`ProjectConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AssetsConfig, CONFIG_FILE_NAME, DefaultsConfig, ProjectConfig, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{DocscopeError, Result};
pub use types::{
    CONTENT_EXTENSION, DEFAULT_AUDIENCE_TARGET, DEFAULT_MANIFEST_FILE, DEFAULT_VISIBILITY_TARGET,
    EXCLUDED_DIRS, FrontMatter, FrontMatterValue, Route,
};
