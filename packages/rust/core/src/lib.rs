//! Core pipeline and domain logic for docscope.
//!
//! This crate ties together tree scanning, page filtering, navigation
//! pruning, asset copying, and output writing into [`pipeline::run_build`].

pub mod assembler;
pub mod assets;
pub mod filter;
pub mod navigation;
pub mod pipeline;
pub mod scan;

pub use assets::{AssetCopy, AssetSet, CopyOutcome};
pub use filter::{AllowedSet, FilterPolicy};
pub use navigation::{NavigationManifest, PruneOutcome};
pub use pipeline::{BuildConfig, BuildReport, ProgressReporter, SilentProgress, run_build};
