//! Title, description, tag, and category extraction from a note's text.
//!
//! ## Title
//!
//! The first top-level heading (`# Title`). Without one, the title comes
//! from the filename via [`naming::title_from_stem`]. Either way it is
//! truncated to [`MAX_TITLE_CHARS`].
//!
//! ## Description
//!
//! The first line after the title heading that is not blank, not a heading,
//! not a bare image, and not an outline property (`key:: value`). An outline
//! bullet marker is stripped first, so `- Notes from the road` yields
//! "Notes from the road". Truncated to [`MAX_DESCRIPTION_CHARS`]; when no
//! such line exists, [`FALLBACK_DESCRIPTION`] is used.
//!
//! ## Tags
//!
//! Inline `#tag` and `#[[multi word tag]]` tokens anywhere in the note.
//! Each is lowercased, renamed through the tag map, and deduplicated; at
//! most [`MAX_CONTENT_TAGS`] distinct tags are taken from the content.
//! Configured default tags are then added regardless of that cap, and the
//! combined list is sorted and deduplicated again.
//!
//! A `#` only starts a tag at the beginning of a line or after whitespace or
//! an opening parenthesis, and must be followed by a letter or digit, so
//! headings (`# Title`), URL fragments (`page#section`), and `##` are not
//! tags. Neither is a link to an anchor on the same page (`[setup](#setup)`).
//!
//! ## Category
//!
//! [`requested_category`] picks the category name to hand to the category
//! resolver: the first note tag with an entry in the category map wins,
//! otherwise the configured category (itself passed through the map).

use crate::config::RunConfig;
use crate::naming;
use crate::types::SourceDocument;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const MAX_CONTENT_TAGS: usize = 10;
pub const FALLBACK_DESCRIPTION: &str = "Imported from notes without a description.";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{1,6}(\s|$)").expect("valid heading regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(])#(?:\[\[(?P<long>[^\]\n]+)\]\]|(?P<short>[\p{L}\p{N}][\p{L}\p{N}_/-]*))")
        .expect("valid tag regex")
});

static BARE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:!\[[^\]]*\]\([^)]*\)|!?\[\[[^\]]+\]\])$").expect("valid bare image regex")
});

static PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+::").expect("valid property regex"));

/// Metadata read straight from the note, before category validation and
/// image resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFields {
    pub title: String,
    pub description: String,
    /// Tags found in the note, renamed and deduplicated, in order of
    /// first appearance (capped at [`MAX_CONTENT_TAGS`]).
    pub content_tags: Vec<String>,
    /// `content_tags` plus configured tags, sorted and deduplicated.
    pub tags: Vec<String>,
}

/// Extract title, description, and tags from a note.
pub fn extract(doc: &SourceDocument, config: &RunConfig) -> DocumentFields {
    let title = extract_title(&doc.content, &doc.stem());
    let description = extract_description(&doc.content);
    let content_tags = extract_content_tags(&doc.content, &config.tag_map);
    let tags = merge_tags(&content_tags, &config.default_tags);
    DocumentFields {
        title,
        description,
        content_tags,
        tags,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}

fn top_level_heading(line: &str) -> Option<&str> {
    line.strip_prefix("# ").map(str::trim)
}

/// Title from the first `# heading`, else from the file stem.
pub fn extract_title(content: &str, stem: &str) -> String {
    let heading = content
        .lines()
        .find_map(top_level_heading)
        .map(|h| h.trim_end_matches('#').trim())
        .filter(|h| !h.is_empty());
    let title = match heading {
        Some(h) => h.to_string(),
        None => naming::title_from_stem(stem),
    };
    truncate_chars(&title, MAX_TITLE_CHARS)
}

/// First descriptive line after the title heading.
pub fn extract_description(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines
        .iter()
        .position(|l| top_level_heading(l).is_some())
        .map(|i| i + 1)
        .unwrap_or(0);

    lines[start..]
        .iter()
        .map(|l| strip_bullet(l.trim()))
        .find(|l| is_description_line(l))
        .map(|l| truncate_chars(l, MAX_DESCRIPTION_CHARS))
        .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string())
}

fn strip_bullet(line: &str) -> &str {
    line.strip_prefix("- ").map(str::trim_start).unwrap_or(line)
}

fn is_description_line(line: &str) -> bool {
    !line.is_empty()
        && line != "-"
        && !HEADING.is_match(line)
        && !BARE_IMAGE.is_match(line)
        && !PROPERTY.is_match(line)
        && !line.starts_with("{{")
}

/// Tags written in the note, in order of first appearance.
pub fn extract_content_tags(content: &str, tag_map: &BTreeMap<String, String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for caps in TAG.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let hash_at = whole.start() + whole.as_str().find('#').unwrap_or(0);
        if content[..hash_at].ends_with("](") {
            continue;
        }
        let raw = caps
            .name("long")
            .or_else(|| caps.name("short"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let tag = normalize_tag(raw);
        if tag.is_empty() {
            continue;
        }
        let tag = tag_map
            .get(&tag)
            .map(|t| normalize_tag(t))
            .unwrap_or(tag);
        if seen.insert(tag.clone()) {
            tags.push(tag);
            if tags.len() == MAX_CONTENT_TAGS {
                break;
            }
        }
    }
    tags
}

fn normalize_tag(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['/', '-', '_'])
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Content tags plus configured tags, sorted and deduplicated.
pub fn merge_tags(content_tags: &[String], configured: &[String]) -> Vec<String> {
    let configured = configured
        .iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty());
    content_tags
        .iter()
        .cloned()
        .chain(configured)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The category name to validate for a note.
pub fn requested_category(
    content_tags: &[String],
    configured: &str,
    category_map: &BTreeMap<String, String>,
) -> String {
    content_tags
        .iter()
        .find_map(|t| category_map.get(t))
        .or_else(|| category_map.get(&configured.to_lowercase()))
        .cloned()
        .unwrap_or_else(|| configured.to_string())
}
