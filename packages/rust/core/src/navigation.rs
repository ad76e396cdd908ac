//! Navigation manifest pruning.
//!
//! The manifest is kept as a `serde_json::Value` so fields this tool does not
//! know about survive the round trip in their original order. Only the
//! `navigation.tabs[].groups[].pages[]` tree is touched.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use docscope_shared::{DocscopeError, Result};

use crate::filter::AllowedSet;

/// A parsed navigation manifest (`docs.json`).
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationManifest {
    doc: Value,
}

/// Result of pruning a manifest against an allowed set.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneOutcome {
    /// The pruned manifest (a fresh tree).
    pub manifest: NavigationManifest,
    /// Page entries removed because they were not allowed.
    pub dropped_pages: usize,
    /// Groups removed because no pages survived.
    pub dropped_groups: usize,
    /// Tabs removed because no groups survived.
    pub dropped_tabs: usize,
}

impl NavigationManifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocscopeError::io(path, e))?;
        Self::from_json_str(&content)
            .map_err(|e| DocscopeError::manifest(format!("{}: {e}", path.display())))
    }

    /// Parse a manifest from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(json)
            .map_err(|e| DocscopeError::manifest(format!("invalid JSON: {e}")))?;
        Self::from_value(doc)
    }

    /// Wrap an already-parsed JSON document.
    pub fn from_value(doc: Value) -> Result<Self> {
        if doc
            .pointer("/navigation/tabs")
            .is_some_and(|tabs| !tabs.is_array())
        {
            return Err(DocscopeError::manifest("navigation.tabs must be an array"));
        }
        Ok(Self { doc })
    }

    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    /// Every page route string in the navigation tree, in manifest order.
    pub fn page_routes(&self) -> Vec<&str> {
        let mut routes = Vec::new();
        for tab in self.tabs() {
            for group in array_field(tab, "groups") {
                collect_routes(array_field(group, "pages"), &mut routes);
            }
        }
        routes
    }

    fn tabs(&self) -> &[Value] {
        self.doc
            .pointer("/navigation/tabs")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Drop every page not in `allowed`, then every empty group, then every
    /// empty tab. Surviving entries keep their order. `self` is untouched.
    ///
    /// A manifest without `navigation.tabs` is returned unchanged.
    #[instrument(skip_all, fields(allowed = allowed.len()))]
    pub fn prune(&self, allowed: &AllowedSet) -> PruneOutcome {
        let mut doc = self.doc.clone();
        let mut counts = Counts::default();

        if let Some(tabs) = doc.pointer_mut("/navigation/tabs").and_then(Value::as_array_mut) {
            let kept: Vec<Value> = tabs
                .iter()
                .filter_map(|tab| prune_tab(tab, allowed, &mut counts))
                .collect();
            *tabs = kept;
        }

        debug!(
            dropped_pages = counts.pages,
            dropped_groups = counts.groups,
            dropped_tabs = counts.tabs,
            "navigation pruned"
        );

        PruneOutcome {
            manifest: Self { doc },
            dropped_pages: counts.pages,
            dropped_groups: counts.groups,
            dropped_tabs: counts.tabs,
        }
    }

    /// Serialize as pretty-printed JSON (2-space indent, no trailing newline).
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.doc)
            .map_err(|e| DocscopeError::validation(format!("JSON serialization failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counts {
    pages: usize,
    groups: usize,
    tabs: usize,
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

fn collect_routes<'a>(pages: &'a [Value], out: &mut Vec<&'a str>) {
    for page in pages {
        match page {
            Value::String(route) => out.push(route),
            Value::Object(_) => collect_routes(array_field(page, "pages"), out),
            _ => {}
        }
    }
}

fn prune_tab(tab: &Value, allowed: &AllowedSet, counts: &mut Counts) -> Option<Value> {
    let Value::Object(fields) = tab else {
        counts.tabs += 1;
        return None;
    };

    let groups: Vec<Value> = array_field(tab, "groups")
        .iter()
        .filter_map(|group| match group {
            Value::Object(g) => prune_group(g, allowed, counts),
            _ => {
                counts.groups += 1;
                None
            }
        })
        .collect();

    if groups.is_empty() {
        counts.tabs += 1;
        return None;
    }

    let mut fields = fields.clone();
    fields.insert("groups".into(), Value::Array(groups));
    Some(Value::Object(fields))
}

/// Prune a group object. Nested group objects inside `pages` are pruned the
/// same way and kept only when they retain a page.
fn prune_group(
    group: &Map<String, Value>,
    allowed: &AllowedSet,
    counts: &mut Counts,
) -> Option<Value> {
    let source = group
        .get("pages")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let mut pages = Vec::with_capacity(source.len());
    for page in source {
        match page {
            Value::String(route) if allowed.contains(route.as_str()) => pages.push(page.clone()),
            Value::Object(nested) if nested.get("pages").is_some_and(Value::is_array) => {
                if let Some(kept) = prune_group(nested, allowed, counts) {
                    pages.push(kept);
                }
            }
            _ => counts.pages += 1,
        }
    }

    if pages.is_empty() {
        counts.groups += 1;
        return None;
    }

    let mut group = group.clone();
    group.insert("pages".into(), Value::Array(pages));
    Some(Value::Object(group))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
