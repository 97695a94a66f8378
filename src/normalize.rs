//! Note body → post body.
//!
//! Stages run in a fixed order, each taking and returning plain text:
//!
//! 1. [`strip_title_line`]: drop a leading `# heading` line (it becomes the title).
//! 2. [`flatten_bullets`]: remove the `- ` outline marker from each line,
//!    keeping indentation.
//! 3. [`replace_block_refs`]: replace balanced `{{...}}` spans with
//!    [`BLOCK_REF_PLACEHOLDER`].
//! 4. Image rewriting ([`crate::images::rewrite_images`]).
//! 5. [`normalize_legacy_paths`]: point `../../assets/`, `../assets/` and
//!    `./assets/` at the asset URL prefix.
//!
//! Image rewriting runs after bullet flattening so a bulleted image line is
//! already plain text, and before legacy-path normalization so references it
//! preserved verbatim stay byte-for-byte intact.

use crate::images::{AssetStore, ImageError, rewrite_images};
use crate::output::Reporter;
use crate::types::ImageReference;
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

/// Stands in for a removed `{{...}}` block reference. An MDX comment, so it
/// renders as nothing.
pub const BLOCK_REF_PLACEHOLDER: &str = "{/* block reference removed */}";

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)- ").expect("valid bullet regex"));

static LEGACY_ASSET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^|[\s("'=])(?P<legacy>\.\./\.\./assets/|\.\./assets/|\./assets/)"#)
        .expect("valid legacy path regex")
});

/// Normalized body plus the image references found while rewriting it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBody {
    pub text: String,
    pub references: Vec<ImageReference>,
}

/// Run every stage over a note's raw text.
pub fn normalize(
    raw: &str,
    doc_dir: &Path,
    store: &mut AssetStore,
    reporter: &mut dyn Reporter,
) -> Result<NormalizedBody, ImageError> {
    let text = strip_title_line(raw);
    let text = flatten_bullets(&text);
    let text = replace_block_refs(&text);
    let rewritten = rewrite_images(&text, doc_dir, store, reporter)?;
    let text = normalize_legacy_paths(&rewritten.text, store.url_prefix(), &rewritten.preserved);
    Ok(NormalizedBody {
        text,
        references: rewritten.references,
    })
}

pub fn strip_title_line(text: &str) -> String {
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (text, ""),
    };
    if first.starts_with("# ") {
        rest.to_string()
    } else {
        text.to_string()
    }
}

pub fn flatten_bullets(text: &str) -> String {
    BULLET.replace_all(text, "$1").into_owned()
}

/// Replace each outermost balanced `{{...}}` span. An unclosed `{{` and
/// everything after it is left alone.
pub fn replace_block_refs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        match balanced_end(&rest[start..]) {
            Some(len) => {
                out.push_str(&rest[..start]);
                out.push_str(BLOCK_REF_PLACEHOLDER);
                rest = &rest[start + len..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Length of the balanced span at the start of `s` (which begins with `{{`).
fn balanced_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match &bytes[i..i + 2] {
            b"{{" => {
                depth += 1;
                i += 2;
            }
            b"}}" => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Rewrite legacy relative asset prefixes to `prefix/`, except inside
/// `preserved` byte ranges.
pub fn normalize_legacy_paths(text: &str, prefix: &str, preserved: &[Range<usize>]) -> String {
    let prefix = prefix.trim_end_matches('/');
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in LEGACY_ASSET_PATH.captures_iter(text) {
        let Some(legacy) = caps.name("legacy") else {
            continue;
        };
        let range = legacy.range();
        if preserved
            .iter()
            .any(|p| range.start < p.end && p.start < range.end)
        {
            continue;
        }
        out.push_str(&text[last..range.start]);
        out.push_str(prefix);
        out.push('/');
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryReporter;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn strips_leading_title_only() {
        assert_eq!(strip_title_line("# My Trip\n\nBody"), "\nBody");
        assert_eq!(strip_title_line("# Only"), "");
        assert_eq!(strip_title_line("Intro\n# Later"), "Intro\n# Later");
        assert_eq!(strip_title_line("## Sub\nBody"), "## Sub\nBody");
    }

    #[test]
    fn flattens_bullets_keeping_indent() {
        let text = "- top\n  - nested\n\t- tab\nnot - a bullet\n-no space";
        assert_eq!(
            flatten_bullets(text),
            "top\n  nested\n\ttab\nnot - a bullet\n-no space"
        );
    }

    #[test]
    fn flattens_only_one_marker() {
        assert_eq!(flatten_bullets("- - double"), "- double");
    }

    #[test]
    fn replaces_block_refs() {
        assert_eq!(
            replace_block_refs("see {{embed ((abc))}} here"),
            format!("see {BLOCK_REF_PLACEHOLDER} here")
        );
    }

    #[test]
    fn nested_block_refs_replaced_once() {
        assert_eq!(
            replace_block_refs("{{outer {{inner}} tail}} and {{two}}"),
            format!("{BLOCK_REF_PLACEHOLDER} and {BLOCK_REF_PLACEHOLDER}")
        );
    }

    #[test]
    fn unbalanced_block_ref_left_alone() {
        assert_eq!(replace_block_refs("a {{open b"), "a {{open b");
        assert_eq!(
            replace_block_refs("{{x}} then {{open"),
            format!("{BLOCK_REF_PLACEHOLDER} then {{{{open")
        );
    }

    #[test]
    fn legacy_paths_normalized() {
        let text = "![a](../../assets/a.png)\n<img src=\"./assets/b.png\">\n../assets/c.png";
        assert_eq!(
            normalize_legacy_paths(text, "/assets/blog", &[]),
            "![a](/assets/blog/a.png)\n<img src=\"/assets/blog/b.png\">\n/assets/blog/c.png"
        );
    }

    #[test]
    fn legacy_paths_need_a_boundary() {
        let text = "foo../assets/x and path/./assets/y";
        assert_eq!(normalize_legacy_paths(text, "/assets/blog", &[]), text);
    }

    #[test]
    fn legacy_paths_skip_preserved_ranges() {
        let text = "![x](../assets/missing.png) [link](../assets/doc.pdf)";
        let preserved = [0..27];
        assert_eq!(
            normalize_legacy_paths(text, "/assets/blog/", &preserved),
            "![x](../assets/missing.png) [link](/assets/blog/doc.pdf)"
        );
    }

    #[test]
    fn pipeline_runs_stages_in_order() {
        let tmp = TempDir::new().unwrap();
        let notes = tmp.path().join("notes");
        let assets = tmp.path().join("out");
        fs::create_dir_all(&notes).unwrap();
        fs::create_dir_all(&assets).unwrap();
        fs::write(notes.join("photo.jpg"), b"img").unwrap();

        let raw = "# Title\n- First point\n  - ![beach](photo.jpg)\n- {{query}}\n- [pdf](../assets/x.pdf)\n- ![[gone.png]]";
        let mut store = AssetStore::new(&assets, "/assets/blog", false);
        let mut reporter = MemoryReporter::new();
        let body = normalize(raw, &notes, &mut store, &mut reporter).unwrap();

        assert_eq!(
            body.text,
            format!(
                "First point\n  ![beach](/assets/blog/photo.jpg)\n{BLOCK_REF_PLACEHOLDER}\n[pdf](/assets/blog/x.pdf)\n![[gone.png]]"
            )
        );
        assert_eq!(body.references.len(), 2);
        assert!(!reporter.warnings().is_empty());
    }

    #[test]
    fn unresolved_legacy_image_preserved_verbatim() {
        let tmp = TempDir::new().unwrap();
        let mut store = AssetStore::new(tmp.path(), "/assets/blog", false);
        let mut reporter = MemoryReporter::new();

        let raw = "Text ![old](../assets/nowhere-xyz.png) end";
        let body = normalize(raw, tmp.path(), &mut store, &mut reporter).unwrap();
        assert_eq!(body.text, raw);
    }
}
