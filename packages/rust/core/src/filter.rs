//! Page filter policies deciding which content files a build includes.

use std::collections::BTreeSet;

use docscope_shared::{FrontMatter, FrontMatterValue, Route};

/// Routes that passed the page filter in one run.
///
/// Both the output writer and the navigation pruner consult exactly this set.
pub type AllowedSet = BTreeSet<Route>;

/// Which filtering predicate a pipeline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Drop pages marked internal. The target only names the output directory.
    Visibility,
    /// Keep pages whose `audience` is absent, empty, or names the target.
    /// Bodies are rewritten for the target.
    Audience,
}

impl FilterPolicy {
    /// Whether a page with front matter `fm` belongs in the `target` build.
    pub fn includes(self, fm: &FrontMatter, target: &str) -> bool {
        match self {
            Self::Visibility => !is_internal(fm),
            Self::Audience => audience_allows(fm, target),
        }
    }

    /// Whether included pages go through the content rewriter.
    pub fn rewrites_content(self) -> bool {
        matches!(self, Self::Audience)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Visibility => "visibility",
            Self::Audience => "audience",
        }
    }
}

impl std::fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `internal: true` or `visibility: internal`.
pub fn is_internal(fm: &FrontMatter) -> bool {
    let flagged = fm
        .scalar("internal")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    flagged || fm.scalar("visibility") == Some("internal")
}

/// Absent or empty audience means every audience.
///
/// Only a list can name audiences: a non-empty scalar such as `audience: pm`
/// matches no target, while an empty scalar counts as absent.
pub fn audience_allows(fm: &FrontMatter, target: &str) -> bool {
    match fm.get("audience") {
        None => true,
        Some(FrontMatterValue::Scalar(value)) => value.is_empty(),
        Some(FrontMatterValue::List(items)) => {
            items.is_empty() || items.iter().any(|a| a == target)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
