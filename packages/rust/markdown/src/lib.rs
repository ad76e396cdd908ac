//! Front-matter extraction and content rewriting for MDX documentation files.
//!
//! [`parse_document`] splits a file into its leading metadata block and body,
//! and [`rewrite::rewrite_body`] applies the audience-pipeline passes to the body.

pub mod rewrite;

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use docscope_shared::{FrontMatter, FrontMatterValue};

pub use rewrite::{filter_audience_blocks, relativize_imports, rewrite_body};

/// Delimiter line opening and closing the front-matter block.
const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A content file split into its metadata and body.
///
/// Borrowed from the raw file text; `header` followed by `body` is always the
/// original text byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    /// Parsed metadata. Empty when the file has no (closed) leading block.
    pub front_matter: FrontMatter,
    /// The raw metadata block including both delimiter lines, or `""`.
    pub header: &'a str,
    /// Everything after the metadata block.
    pub body: &'a str,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Split raw file text into front matter and body.
///
/// Never fails: a missing or unterminated block yields an empty mapping with
/// the whole text as body, and lines that are not `key: value` are skipped.
pub fn parse_document(raw: &str) -> Document<'_> {
    match split_block(raw) {
        Some((block, header_len)) => Document {
            front_matter: parse_block(block),
            header: &raw[..header_len],
            body: &raw[header_len..],
        },
        None => Document {
            front_matter: FrontMatter::new(),
            header: "",
            body: raw,
        },
    }
}

/// Parse only the front matter of `raw`.
pub fn parse_front_matter(raw: &str) -> FrontMatter {
    parse_document(raw).front_matter
}

/// Locate the leading block. Returns the block contents (between the
/// delimiter lines) and the byte length of the whole header.
fn split_block(raw: &str) -> Option<(&str, usize)> {
    let mut lines = raw.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&raw[block_start..offset], offset + line.len()));
        }
        offset += line.len();
    }

    trace!("front-matter block has no closing delimiter");
    None
}

/// Parse the `key: value` lines of a metadata block.
fn parse_block(block: &str) -> FrontMatter {
    static KV_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^([A-Za-z0-9_]+)\s*:\s*(.*)$").expect("valid regex")
    });

    let mut fm = FrontMatter::new();
    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(caps) = KV_RE.captures(line) else {
            trace!(line, "skipping non key/value front-matter line");
            continue;
        };
        fm.insert(&caps[1], parse_value(caps[2].trim()));
    }
    fm
}

fn parse_value(value: &str) -> FrontMatterValue {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let inner = inner.trim();
        if inner.is_empty() {
            return FrontMatterValue::List(Vec::new());
        }
        let items = inner
            .split(',')
            .map(|item| strip_quotes(item.trim()).to_string())
            .collect();
        return FrontMatterValue::List(items);
    }

    FrontMatterValue::Scalar(strip_quotes(value).to_string())
}

/// Remove one matching pair of surrounding `'` or `"` quotes.
fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
