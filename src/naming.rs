//! Titles from filenames and slugs from titles.
//!
//! ## Slugs
//!
//! A slug is the output filename stem and the post's URL segment. It is a
//! pure function of the title text:
//!
//! - `"My Trip"` → `my-trip`
//! - `"Rust & Safety: Part 2!"` → `rust-safety-part-2`
//! - `"C++"` and `"c"` both → `c` (titles differing only in punctuation or
//!   case may collide; the post writer's overwrite policy settles that)
//!
//! A title with no ASCII letters or digits slugifies to the empty string.
//! [`post_slug`] replaces that with `post-<hash>` derived from the note's
//! content so the output filename is never empty.
//!
//! ## Filename Titles
//!
//! Notes without a `# heading` are titled from their filename. Export tools
//! encode namespaces and spaces in filenames, so the stem is cleaned up:
//! - `My_Trip_to_Rome` → "My Trip to Rome"
//! - `projects%2Fblog-ideas` → "projects blog ideas"
//! - `2024-01-15` → "2024 01 15"

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Encodings of `/` that export tools put in filenames.
const ENCODED_SEPARATORS: &[&str] = &["%2F", "%2f", "%5C", "%5c", "___"];

/// Characters that cannot appear in a title used as a path component.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Convert a title into a URL-safe slug.
///
/// Lowercases, replaces every run of characters outside `[a-z0-9]` with a
/// single hyphen, and strips leading and trailing hyphens.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug for a post, never empty.
///
/// Falls back to `post-<first 8 hex chars of SHA-256(content)>` when the
/// title has nothing slug-worthy in it.
pub fn post_slug(title: &str, content: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        fallback_slug(content)
    } else {
        slug
    }
}

fn fallback_slug(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("post-{hex}")
}

/// Derive a display title from a note's file stem.
pub fn title_from_stem(stem: &str) -> String {
    let mut title = stem.to_string();
    for encoded in ENCODED_SEPARATORS {
        title = title.replace(encoded, " ");
    }
    let title: String = title
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c == '_' || c == '-' {
                ' '
            } else {
                c
            }
        })
        .collect();
    WHITESPACE_RUN.replace_all(title.trim(), " ").into_owned()
}
