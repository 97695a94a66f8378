//! Discovery of source notes.
//!
//! The input is either a single note or a directory tree of them:
//!
//! ```text
//! export/
//! ├── pages/
//! │   ├── My_Trip.md              # imported
//! │   ├── projects%2Fblog.md      # imported
//! │   └── Untitled.md             # dropped by EXCLUDE_PATTERN='^Untitled'
//! ├── journals/
//! │   └── 2024_01_15.md           # imported
//! ├── assets/
//! │   └── photo.jpg               # not a note; found later by the image resolver
//! └── .obsidian/                  # hidden, never entered
//! ```
//!
//! ## Rules
//!
//! - A file input is returned as-is, with no extension or pattern checks.
//! - A directory is walked recursively in filename order. Hidden entries
//!   (leading `.`) are skipped and not descended into.
//! - Only files with a note extension ([`NOTE_EXTENSIONS`]) are candidates.
//! - If an include pattern is set, a candidate's file name must match it.
//! - If an exclude pattern is set, a candidate whose file name matches it is
//!   skipped.
//!
//! [`scan`] yields lazily; nothing is read beyond directory entries.

use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid filename pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Cannot read directory entry: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Extensions recognized as notes (compared case-insensitively).
pub const NOTE_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Include/exclude filter applied to candidate file names.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl FileFilter {
    /// Compile the filter. Empty patterns count as unset.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self, ScanError> {
        let compile = |p: Option<&str>| -> Result<Option<Regex>, ScanError> {
            match p.map(str::trim).filter(|p| !p.is_empty()) {
                Some(p) => Ok(Some(Regex::new(p)?)),
                None => Ok(None),
            }
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Whether a file with this name should be imported.
    pub fn accepts(&self, file_name: &str) -> bool {
        if let Some(include) = &self.include
            && !include.is_match(file_name)
        {
            return false;
        }
        if let Some(exclude) = &self.exclude
            && exclude.is_match(file_name)
        {
            return false;
        }
        true
    }
}

/// Lazily produced candidate note paths.
pub type Candidates<'a> = Box<dyn Iterator<Item = Result<PathBuf, ScanError>> + 'a>;

/// Enumerate notes under `input`.
///
/// Fails up front only if `input` does not exist. Unreadable directory
/// entries are yielded as errors so the caller can count them and carry on.
pub fn scan<'a>(input: &Path, filter: &'a FileFilter) -> Result<Candidates<'a>, ScanError> {
    if !input.exists() {
        return Err(ScanError::NotFound(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(Box::new(std::iter::once(Ok(input.to_path_buf()))));
    }

    let walker = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    Ok(Box::new(walker.filter_map(move |entry| match entry {
        Ok(entry) => is_candidate(&entry, filter).then(|| Ok(entry.into_path())),
        Err(e) => Some(Err(ScanError::Walk(e))),
    })))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_candidate(entry: &DirEntry, filter: &FileFilter) -> bool {
    if !entry.file_type().is_file() {
        return false;
    }
    let path = entry.path();
    let has_note_ext = path
        .extension()
        .map(|e| {
            let e = e.to_string_lossy();
            NOTE_EXTENSIONS.iter().any(|n| e.eq_ignore_ascii_case(n))
        })
        .unwrap_or(false);
    has_note_ext && filter.accepts(&entry.file_name().to_string_lossy())
}
