//! Core domain types shared by the docscope crates.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::path::Path;

/// File extension (without the dot) of documentation content files.
pub const CONTENT_EXTENSION: &str = "mdx";

/// Directory names never descended into while scanning a tree.
pub const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "build"];

/// Default navigation manifest file name at the tree root.
pub const DEFAULT_MANIFEST_FILE: &str = "docs.json";

/// Default build target of the visibility pipeline.
pub const DEFAULT_VISIBILITY_TARGET: &str = "public";

/// Default build target of the audience pipeline.
pub const DEFAULT_AUDIENCE_TARGET: &str = "dev";

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Route-normalized identifier of a content file.
///
/// Forward slashes only, no content extension. This is the join key between
/// files on disk and page references in the navigation manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route(String);

impl Route {
    /// Derive a route from a path relative to the tree root.
    pub fn from_relative_path(rel: &Path) -> Self {
        Self::from_relative_str(&rel.to_string_lossy())
    }

    /// Derive a route from a relative path string, normalizing `\` to `/`.
    pub fn from_relative_str(rel: &str) -> Self {
        let normalized = rel.replace('\\', "/");
        let suffix = format!(".{CONTENT_EXTENSION}");
        let route = normalized
            .strip_suffix(&suffix)
            .unwrap_or(&normalized)
            .to_string();
        Self(route)
    }

    /// The route as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Route {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// FrontMatter
// ---------------------------------------------------------------------------

/// A single front-matter value: a scalar string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterValue {
    Scalar(String),
    List(Vec<String>),
}

/// Key/value metadata read from the leading block of a content file.
///
/// Values are kept as strings; no numeric or boolean coercion happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: BTreeMap<String, FrontMatterValue>,
}

impl FrontMatter {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any earlier value for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: FrontMatterValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.fields.get(key)
    }

    /// Scalar value for `key`, if present and not a list.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            FrontMatterValue::Scalar(s) => Some(s),
            FrontMatterValue::List(_) => None,
        }
    }

    /// List value for `key`, if present and a list.
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.fields.get(key)? {
            FrontMatterValue::List(items) => Some(items),
            FrontMatterValue::Scalar(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
