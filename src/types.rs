//! Shared types passed between pipeline stages.
//!
//! Everything here is transient: built while one document is imported and
//! dropped once its post is written (or its import fails). Nothing is
//! persisted between runs other than the files themselves.

use crate::category::Category;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A source note discovered by the scanner and read into memory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Absolute path of the note.
    pub path: PathBuf,
    /// Raw text as read from disk.
    pub content: String,
    /// Directory containing the note; base for relative image lookups.
    pub dir: PathBuf,
}

impl SourceDocument {
    /// Read a note from disk.
    pub fn load(path: &Path) -> io::Result<Self> {
        let path = std::path::absolute(path)?;
        let content = std::fs::read_to_string(&path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { path, content, dir })
    }

    /// File stem of the note (`My_Trip` for `notes/My_Trip.md`).
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Everything derived from a note that ends up in the post header.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetadata {
    pub title: String,
    pub description: String,
    /// Lowercase, sorted, deduplicated.
    pub tags: Vec<String>,
    pub category: Category,
    pub slug: String,
    pub hero_image: String,
}

/// Which in-text syntax an image reference was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSyntax {
    /// `![alt](path)`
    Inline,
    /// `![[path]]` or `[[path]]`
    Embed,
}

/// One image reference found in a note's text.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReference {
    pub syntax: ImageSyntax,
    /// The token exactly as written, e.g. `![beach](photo.jpg)`.
    pub token: String,
    /// The path portion as written, e.g. `photo.jpg`.
    pub path: String,
    /// Alt text, for inline references that carry one.
    pub alt: Option<String>,
    /// Byte range of `token` in the text it was found in.
    pub span: Range<usize>,
    /// Source file the reference resolved to, if any.
    pub resolved: Option<PathBuf>,
    /// Destination filename in the asset store, once copied.
    pub dest_name: Option<String>,
    /// Replacement token, once rewritten.
    pub rewritten: Option<String>,
}

impl ImageReference {
    /// Base name of the referenced file (`photo.jpg` for `../assets/photo.jpg`).
    pub fn base_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.path)
    }
}

/// A fully rendered post ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    /// `<posts_dir>/<slug>.<ext>`
    pub path: PathBuf,
    /// Header followed by the normalized body.
    pub content: String,
}
