//! Body rewriting passes for the audience pipeline.
//!
//! Each pass is a function `&str -> String` applied in sequence:
//! 1. root-relative imports become file-relative
//! 2. `<audience data-audience="...">` blocks are unwrapped or removed

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

/// Root namespaces the publishing target resolves from the site root
/// regardless of page depth. Imports under these stay absolute.
pub const RESERVED_IMPORT_ROOTS: &[&str] = &["snippets", "images", "logo", "api-reference"];

/// Run every rewrite pass on a file body.
///
/// `source_rel` is the file's path relative to the tree root
/// (e.g. `guides/setup.mdx`); `target` is the build target identifier.
pub fn rewrite_body(body: &str, source_rel: &str, target: &str) -> String {
    let result = relativize_imports(body, source_rel);
    filter_audience_blocks(&result, target)
}

// ---------------------------------------------------------------------------
// Pass 1: Import path relativization
// ---------------------------------------------------------------------------

/// Rewrite `import ... from '/path'` to a path relative to the file's directory.
pub fn relativize_imports(body: &str, source_rel: &str) -> String {
    static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)(import\s+.+?from\s+['"])(/[^'"\n]+)(['"])"#).expect("valid regex")
    });

    let source_rel = source_rel.replace('\\', "/");
    let source_dir = source_rel.rsplit_once('/').map_or("", |(dir, _)| dir);

    IMPORT_RE
        .replace_all(body, |caps: &Captures<'_>| {
            let target = &caps[2];
            if is_reserved(target) {
                return caps[0].to_string();
            }

            let relative = relative_path(source_dir, &target[1..]);
            let relative = if relative == ".." || relative.starts_with("./") || relative.starts_with("../") {
                relative
            } else {
                format!("./{relative}")
            };
            trace!(from = target, to = %relative, "relativized import");
            format!("{}{relative}{}", &caps[1], &caps[3])
        })
        .into_owned()
}

/// Whether an absolute import path lives under a reserved root namespace.
fn is_reserved(absolute: &str) -> bool {
    let first = absolute
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    RESERVED_IMPORT_ROOTS.contains(&first)
}

/// Compute the `/`-separated path from directory `from_dir` to `to`,
/// both relative to the same root.
fn relative_path(from_dir: &str, to: &str) -> String {
    let from = normalize_segments(from_dir);
    let to = normalize_segments(to);

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<&str> = std::iter::repeat_n("..", from.len() - common).collect();
    parts.extend(&to[common..]);
    parts.join("/")
}

/// Split a path into segments, resolving `.` and `..` lexically.
fn normalize_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

// ---------------------------------------------------------------------------
// Pass 2: Conditional audience blocks
// ---------------------------------------------------------------------------

/// A matched `<audience ...>` / `</audience>` pair, as byte offsets.
#[derive(Debug)]
struct Block<'a> {
    open_start: usize,
    open_end: usize,
    close_start: usize,
    close_end: usize,
    audiences: &'a str,
}

/// Keep the inner content of audience blocks naming `target`, drop the rest.
///
/// Tags are paired with a depth stack, so the innermost open tag binds to the
/// nearest close tag. A dropped block removes everything it encloses; a kept
/// block has its own nested blocks filtered in turn. Unmatched open or close
/// tags are left in place verbatim.
pub fn filter_audience_blocks(body: &str, target: &str) -> String {
    let blocks = match_blocks(body);
    if blocks.is_empty() {
        return body.to_string();
    }

    let mut out = String::with_capacity(body.len());
    render_span(body, 0, body.len(), &blocks, target, &mut out);
    out
}

/// Pair open and close tags. The result is sorted by open position and
/// properly nested.
fn match_blocks(body: &str) -> Vec<Block<'_>> {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"(?i)<audience\s+data-audience\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')\s*>|(?P<close></audience\s*>)"#,
        )
        .expect("valid regex")
    });

    let mut open: Vec<(usize, usize, &str)> = Vec::new();
    let mut blocks = Vec::new();

    for caps in TAG_RE.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        if caps.name("close").is_some() {
            match open.pop() {
                Some((open_start, open_end, audiences)) => blocks.push(Block {
                    open_start,
                    open_end,
                    close_start: whole.start(),
                    close_end: whole.end(),
                    audiences,
                }),
                None => trace!(at = whole.start(), "unmatched closing audience tag"),
            }
        } else {
            let audiences = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .map_or("", |m| m.as_str());
            open.push((whole.start(), whole.end(), audiences));
        }
    }

    if !open.is_empty() {
        trace!(count = open.len(), "unmatched opening audience tags");
    }

    blocks.sort_by_key(|b| b.open_start);
    blocks
}

/// Copy `body[start..end]` into `out`, resolving the blocks inside it.
/// `blocks` holds exactly the blocks contained in the span.
fn render_span(
    body: &str,
    start: usize,
    end: usize,
    blocks: &[Block<'_>],
    target: &str,
    out: &mut String,
) {
    let mut cursor = start;
    let mut i = 0;

    while i < blocks.len() {
        let block = &blocks[i];

        // Children are the following blocks that open before this one closes
        let mut j = i + 1;
        while j < blocks.len() && blocks[j].open_start < block.close_start {
            j += 1;
        }

        out.push_str(&body[cursor..block.open_start]);
        if includes_target(block.audiences, target) {
            render_span(
                body,
                block.open_end,
                block.close_start,
                &blocks[i + 1..j],
                target,
                out,
            );
        }

        cursor = block.close_end;
        i = j;
    }

    out.push_str(&body[cursor..end]);
}

fn includes_target(audiences: &str, target: &str) -> bool {
    audiences.split(',').map(str::trim).any(|a| a == target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_namespace_imports_untouched() {
        let body = "import X from '/snippets/x.mdx'\n";
        assert_eq!(relativize_imports(body, "guides/setup.mdx"), body);

        let body = "import Logo from \"/logo/dark.svg\";\nimport Img from '/images/a.png'\nimport Spec from '/api-reference/openapi.json'\n";
        assert_eq!(relativize_imports(body, "a/b/c.mdx"), body);
    }

    #[test]
    fn root_relative_import_becomes_relative() {
        let body = "import Y from '/reference/y.mdx'\n";
        assert_eq!(
            relativize_imports(body, "guides/setup.mdx"),
            "import Y from '../reference/y.mdx'\n"
        );
    }

    #[test]
    fn relativization_depths() {
        let body = "import Y from \"/reference/y.mdx\"";
        assert_eq!(
            relativize_imports(body, "index.mdx"),
            "import Y from \"./reference/y.mdx\""
        );
        assert_eq!(
            relativize_imports(body, "reference/index.mdx"),
            "import Y from \"./y.mdx\""
        );
        assert_eq!(
            relativize_imports(body, "a/b/c/page.mdx"),
            "import Y from \"../../../reference/y.mdx\""
        );
        assert_eq!(
            relativize_imports(body, "reference/deep/page.mdx"),
            "import Y from \"../y.mdx\""
        );
    }

    #[test]
    fn reserved_match_is_segment_based() {
        let body = "import Z from '/snippets-legacy/z.mdx'";
        assert_eq!(
            relativize_imports(body, "guides/setup.mdx"),
            "import Z from '../snippets-legacy/z.mdx'"
        );
    }

    #[test]
    fn relative_imports_and_packages_untouched() {
        let body = "import A from './a.mdx'\nimport { B } from 'pkg'\n";
        assert_eq!(relativize_imports(body, "guides/setup.mdx"), body);
    }

    #[test]
    fn multiline_named_imports() {
        let body = "import {\n  One,\n  Two,\n} from '/components/all.mdx'\n";
        assert_eq!(
            relativize_imports(body, "guides/setup.mdx"),
            "import {\n  One,\n  Two,\n} from '../components/all.mdx'\n"
        );
    }

    #[test]
    fn backslash_source_paths() {
        let body = "import Y from '/reference/y.mdx'";
        assert_eq!(
            relativize_imports(body, "guides\\setup.mdx"),
            "import Y from '../reference/y.mdx'"
        );
    }

    #[test]
    fn relative_path_helper() {
        assert_eq!(relative_path("", "a/b"), "a/b");
        assert_eq!(relative_path("a", "a"), "");
        assert_eq!(relative_path("a/b", "a/c/d"), "../c/d");
        assert_eq!(relative_path("x", "./y/../z"), "../z");
    }

    #[test]
    fn audience_block_kept_for_listed_target() {
        let body = "<audience data-audience=\"dev, pm\"> content </audience>";
        assert_eq!(filter_audience_blocks(body, "pm"), " content ");
        assert_eq!(filter_audience_blocks(body, "dev"), " content ");
    }

    #[test]
    fn audience_block_dropped_for_other_target() {
        let body = "before<audience data-audience=\"dev, pm\"> content </audience>after";
        assert_eq!(filter_audience_blocks(body, "qa"), "beforeafter");
    }

    #[test]
    fn multiline_and_case_insensitive_tags() {
        let body = "A\n<Audience data-audience=\"pm\">\nline one\nline two\n</AUDIENCE>\nB";
        assert_eq!(filter_audience_blocks(body, "pm"), "A\n\nline one\nline two\n\nB");
        assert_eq!(filter_audience_blocks(body, "dev"), "A\n\nB");
    }

    #[test]
    fn multiple_sibling_blocks() {
        let body = "<audience data-audience=\"dev\">D</audience>|<audience data-audience=\"pm\">P</audience>";
        assert_eq!(filter_audience_blocks(body, "dev"), "D|");
        assert_eq!(filter_audience_blocks(body, "pm"), "|P");
    }

    #[test]
    fn audience_match_is_exact_per_item() {
        let body = "<audience data-audience=\"developer\">x</audience>";
        assert_eq!(filter_audience_blocks(body, "dev"), "");
    }

    #[test]
    fn nested_blocks_resolve_innermost_first() {
        let body = "<audience data-audience=\"dev,pm\">outer <audience data-audience=\"pm\">inner</audience> tail</audience>";
        assert_eq!(filter_audience_blocks(body, "pm"), "outer inner tail");
        assert_eq!(filter_audience_blocks(body, "dev"), "outer  tail");
        assert_eq!(filter_audience_blocks(body, "qa"), "");
    }

    #[test]
    fn dropped_outer_block_removes_kept_inner() {
        let body = "<audience data-audience=\"dev\">a<audience data-audience=\"pm\">b</audience>c</audience>";
        assert_eq!(filter_audience_blocks(body, "pm"), "");
    }

    #[test]
    fn unmatched_tags_left_verbatim() {
        let body = "</audience>text<audience data-audience=\"pm\">open only";
        assert_eq!(filter_audience_blocks(body, "pm"), body);

        let body = "<audience data-audience=\"dev\">x <audience data-audience=\"pm\">y</audience> z";
        assert_eq!(
            filter_audience_blocks(body, "pm"),
            "<audience data-audience=\"dev\">x y z"
        );
    }

    #[test]
    fn no_blocks_is_identity() {
        let body = "# Title\n\nPlain text with <Note>other tags</Note>.\n";
        assert_eq!(filter_audience_blocks(body, "dev"), body);
    }

    #[test]
    fn rewrite_body_runs_both_passes() {
        let body = "import Y from '/reference/y.mdx'\n\n<audience data-audience=\"pm\">PM only</audience>\n";
        assert_eq!(
            rewrite_body(body, "guides/setup.mdx", "dev"),
            "import Y from '../reference/y.mdx'\n\n\n"
        );
    }
}
