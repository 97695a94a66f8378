//! Image reference resolution, copying, and rewriting.
//!
//! # Recognized Syntax
//!
//! | Syntax | Example | Alt text in rewrite |
//! |---|---|---|
//! | Inline image | `![beach](photo.jpg)` | `beach` (file name if empty) |
//! | Embed | `![[photo.jpg]]`, `[[photo.jpg]]`, `![[photo.jpg\|300]]` | file name |
//!
//! Embeds only count as images when the path ends in one of
//! [`IMAGE_EXTENSIONS`]; `[[Some Page]]` is an ordinary wiki link and is left
//! alone. Remote (`http://`, `https://`, `data:`) references and references
//! already pointing at the asset URL prefix are left alone too.
//!
//! # Resolution
//!
//! Export tools put images in different places relative to the note, so each
//! reference is looked up in order (first existing file wins):
//!
//! ```text
//! 1. <note dir>/<path as written>
//! 2. <note dir>/assets/<file name>
//! 3. <note dir>/../assets/<file name>
//! 4. ../assets/<file name>            (relative to the working directory)
//! ```
//!
//! A resolved image is copied into the [`AssetStore`] and its token rewritten
//! to `![alt](<asset prefix>/<dest name>)`, with spaces and parentheses in the
//! name percent-encoded. An unresolved token is left
//! byte-for-byte as written, with one warning per location tried and a final
//! warning naming the token.
//!
//! # Asset Store Naming
//!
//! The destination keeps the source file name. When a different file of that
//! name is already there, a counter goes before the extension
//! (`photo.jpg` → `photo-1.jpg` → `photo-2.jpg`). When the file already
//! there has identical content it is reused, so importing a note twice, or
//! copying the same image for the hero pass and the rewrite pass, never
//! produces duplicates.
//!
//! In dry-run mode nothing is copied; the store remembers which names it
//! would have used so collision numbering matches a real run.
//!
//! # Hero Image
//!
//! [`select_hero`] runs independently of the rewrite pass: the first image
//! reference in the note, if it resolves; otherwise a random image already
//! in the asset store; otherwise the configured default.

use crate::output::Reporter;
use crate::types::{ImageReference, ImageSyntax};
use rand::RngCore;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to copy {src} to {dest}: {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot read asset directory {path}: {source}")]
    ReadStore {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File extensions treated as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "avif", "bmp", "tif", "tiff", "heic",
];

static IMAGE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?P<inline>!\[(?P<alt>[^\]\n]*)\]\((?:<(?P<angled>[^>\n]+)>|(?P<path>(?:[^()\s]|\([^()\s]*\))+))(?:\s+"[^"\n]*")?\))"#,
        r"|(?P<embed>!?\[\[(?P<target>[^\]|\n]+?\.(?i:png|jpe?g|gif|webp|svg|avif|bmp|tiff?|heic))\s*(?:\|[^\]\n]*)?\]\])",
    ))
    .expect("valid image reference regex")
});

fn reference_from(caps: &Captures) -> Option<ImageReference> {
    let whole = caps.get(0)?;
    let (syntax, path, alt) = if caps.name("inline").is_some() {
        let path = caps.name("angled").or_else(|| caps.name("path"))?;
        let alt = caps.name("alt").map(|a| a.as_str().trim().to_string());
        (ImageSyntax::Inline, path.as_str(), alt)
    } else {
        (ImageSyntax::Embed, caps.name("target")?.as_str(), None)
    };
    Some(ImageReference {
        syntax,
        token: whole.as_str().to_string(),
        path: path.trim().to_string(),
        alt,
        span: whole.range(),
        resolved: None,
        dest_name: None,
        rewritten: None,
    })
}

/// Every image reference in `text`, in order of appearance.
pub fn find_references(text: &str) -> Vec<ImageReference> {
    IMAGE_REF
        .captures_iter(text)
        .filter_map(|caps| reference_from(&caps))
        .collect()
}

fn is_remote(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    ["http://", "https://", "data:", "//"]
        .iter()
        .any(|p| lower.starts_with(p))
}

/// Decode `%XX` escapes in a reference path (`My%20Photo.jpg`).
fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3])
            && let Ok(b) = u8::from_str_radix(hex, 16)
        {
            out.push(b);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| path.to_string())
}

/// Percent-encode whitespace, `%`, parentheses and angle brackets.
fn encode_url_path(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            ' ' | '\t' | '%' | '(' | ')' | '<' | '>' => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Locations tried for a reference, in priority order, without duplicates.
pub fn candidate_paths(doc_dir: &Path, reference_path: &str) -> Vec<PathBuf> {
    let decoded = percent_decode(reference_path);
    let as_written = Path::new(&decoded);
    let file_name = as_written
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| as_written.to_path_buf());

    let mut candidates = vec![
        doc_dir.join(as_written),
        doc_dir.join("assets").join(&file_name),
    ];
    if let Some(parent) = doc_dir.parent() {
        candidates.push(parent.join("assets").join(&file_name));
    }
    candidates.push(Path::new("../assets").join(&file_name));

    let mut unique = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !unique.contains(&c) {
            unique.push(c);
        }
    }
    unique
}

/// Where a resolved image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementStatus {
    /// Copied into the store.
    Copied,
    /// An identical file was already in the store.
    Reused,
    /// Dry run: would have been copied.
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub file_name: String,
    pub url: String,
    pub status: PlacementStatus,
}

/// The destination image directory.
#[derive(Debug)]
pub struct AssetStore {
    dir: PathBuf,
    url_prefix: String,
    dry_run: bool,
    /// Dry-run reservations: destination name → source content hash.
    planned: HashMap<String, String>,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str, dry_run: bool) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            dry_run,
            planned: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// URL of a stored file. Characters that would end or split an inline
    /// image destination are percent-encoded.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.url_prefix, encode_url_path(file_name))
    }

    /// Copy `source` into the store under a collision-free name.
    pub fn place(&mut self, source: &Path) -> Result<Placement, ImageError> {
        let copy_err = |dest: &Path, e: io::Error| ImageError::Copy {
            src: source.to_path_buf(),
            dest: dest.to_path_buf(),
            source: e,
        };
        let source_hash = hash_file(source).map_err(|e| copy_err(&self.dir, e))?;
        let original = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let mut counter = 0;
        loop {
            let name = numbered_name(&original, counter);
            let dest = self.dir.join(&name);

            if let Some(planned_hash) = self.planned.get(&name) {
                if *planned_hash == source_hash {
                    return Ok(self.placement(name, PlacementStatus::Planned));
                }
                counter += 1;
                continue;
            }
            if dest.exists() {
                if hash_file(&dest).is_ok_and(|h| h == source_hash) {
                    return Ok(self.placement(name, PlacementStatus::Reused));
                }
                counter += 1;
                continue;
            }
            if self.dry_run {
                self.planned.insert(name.clone(), source_hash);
                return Ok(self.placement(name, PlacementStatus::Planned));
            }
            fs::copy(source, &dest).map_err(|e| copy_err(&dest, e))?;
            return Ok(self.placement(name, PlacementStatus::Copied));
        }
    }

    fn placement(&self, file_name: String, status: PlacementStatus) -> Placement {
        Placement {
            url: self.url_for(&file_name),
            file_name,
            status,
        }
    }

    /// Image files currently in the store, sorted by name.
    pub fn existing_images(&self) -> Result<Vec<String>, ImageError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ImageError::ReadStore {
            path: self.dir.clone(),
            source,
        })?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| !n.starts_with('.') && has_image_extension(n))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// `photo.jpg` → `photo.jpg`, `photo-1.jpg`, `photo-2.jpg`, ...
fn numbered_name(original: &str, counter: u32) -> String {
    if counter == 0 {
        return original.to_string();
    }
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{counter}.{ext}"),
        _ => format!("{original}-{counter}"),
    }
}

fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|e| {
            let e = e.to_string_lossy();
            IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x))
        })
        .unwrap_or(false)
}

fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// First existing candidate for a reference, or `None`.
fn locate(doc_dir: &Path, reference_path: &str) -> (Option<PathBuf>, Vec<PathBuf>) {
    let candidates = candidate_paths(doc_dir, reference_path);
    let found = candidates.iter().find(|c| c.is_file()).cloned();
    (found, candidates)
}

/// Whether a reference should be left alone without warnings.
fn is_passthrough(reference: &ImageReference, store: &AssetStore) -> bool {
    is_remote(&reference.path) || reference.path.starts_with(&format!("{}/", store.url_prefix()))
}

fn rewritten_token(reference: &ImageReference, url: &str) -> String {
    let alt = reference
        .alt
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| reference.base_name());
    format!("![{alt}]({url})")
}

/// Result of the rewrite pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutcome {
    pub text: String,
    /// Every reference found, with resolution details filled in.
    pub references: Vec<ImageReference>,
    /// Byte ranges in `text` of tokens left untouched.
    pub preserved: Vec<Range<usize>>,
}

impl RewriteOutcome {
    pub fn resolved_count(&self) -> usize {
        self.references.iter().filter(|r| r.rewritten.is_some()).count()
    }
}

/// Resolve, copy, and rewrite every image reference in `text`.
pub fn rewrite_images(
    text: &str,
    doc_dir: &Path,
    store: &mut AssetStore,
    reporter: &mut dyn Reporter,
) -> Result<RewriteOutcome, ImageError> {
    let mut out = String::with_capacity(text.len());
    let mut references = Vec::new();
    let mut preserved = Vec::new();
    let mut last = 0;

    for mut reference in find_references(text) {
        out.push_str(&text[last..reference.span.start]);
        last = reference.span.end;

        if is_passthrough(&reference, store) {
            reporter.debug(&format!("Leaving image reference as is: {}", reference.token));
            preserved.push(out.len()..out.len() + reference.token.len());
            out.push_str(&reference.token);
            references.push(reference);
            continue;
        }

        let (found, tried) = locate(doc_dir, &reference.path);
        match found {
            Some(source) => {
                let placement = store.place(&source)?;
                reporter.debug(&format!(
                    "Image {} -> {} ({:?})",
                    source.display(),
                    placement.url,
                    placement.status
                ));
                let token = rewritten_token(&reference, &placement.url);
                out.push_str(&token);
                reference.resolved = Some(source);
                reference.dest_name = Some(placement.file_name);
                reference.rewritten = Some(token);
            }
            None => {
                for path in &tried {
                    reporter.warn(&format!("Image not found at {}", path.display()));
                }
                reporter.warn(&format!(
                    "Unresolved image reference preserved verbatim: {}",
                    reference.token
                ));
                preserved.push(out.len()..out.len() + reference.token.len());
                out.push_str(&reference.token);
            }
        }
        references.push(reference);
    }
    out.push_str(&text[last..]);

    Ok(RewriteOutcome {
        text: out,
        references,
        preserved,
    })
}

/// Pick the post's hero image URL.
pub fn select_hero(
    text: &str,
    doc_dir: &Path,
    store: &mut AssetStore,
    default_hero: &str,
    rng: &mut dyn RngCore,
    reporter: &mut dyn Reporter,
) -> Result<String, ImageError> {
    if let Some(first) = find_references(text).into_iter().next()
        && !is_remote(&first.path)
    {
        if first.path.starts_with(&format!("{}/", store.url_prefix())) {
            return Ok(first.path);
        }
        if let (Some(source), _) = locate(doc_dir, &first.path) {
            let placement = store.place(&source)?;
            reporter.debug(&format!("Hero image: {}", placement.url));
            return Ok(placement.url);
        }
    }

    let existing = store.existing_images()?;
    if let Some(name) = existing.choose(rng) {
        let url = store.url_for(name);
        reporter.debug(&format!("No usable image in note, random hero: {url}"));
        return Ok(url);
    }

    reporter.debug(&format!("Asset store empty, default hero: {default_hero}"));
    Ok(default_hero.to_string())
}
