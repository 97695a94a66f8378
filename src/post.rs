//! Post assembly and writing.
//!
//! ## Header Format
//!
//! Keys are always emitted in this order; `draft` only appears when true:
//!
//! ```text
//! ---
//! heroImage: "/assets/blog/photo.jpg"
//! category: Coding
//! description: "A short trip recap."
//! pubDate: 2024-01-15T10:30:00.000Z
//! tags:
//!   - "coding"
//!   - "travel"
//! title: "My Trip"
//! draft: true
//! ---
//!
//! <body>
//! ```
//!
//! ## Writing
//!
//! [`write_post`] never partially writes a post: the content goes to a hidden
//! sibling file first and is renamed over the destination. When the
//! destination exists, an [`OverwritePolicy`] decides. A declined overwrite
//! is a skip, not an error.

use crate::output::{Reporter, format_preview};
use crate::types::BlogPost;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid post path: {0}")]
    InvalidPath(PathBuf),
}

/// Header fields of a post.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub hero_image: String,
    pub category: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub title: String,
    pub draft: bool,
}

impl FrontMatter {
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!("heroImage: {}\n", quote(&self.hero_image)));
        out.push_str(&format!("category: {}\n", self.category));
        out.push_str(&format!("description: {}\n", quote(&self.description)));
        out.push_str(&format!(
            "pubDate: {}\n",
            self.pub_date.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        if self.tags.is_empty() {
            out.push_str("tags: []\n");
        } else {
            out.push_str("tags:\n");
            for tag in &self.tags {
                out.push_str(&format!("  - {}\n", quote(tag)));
            }
        }
        out.push_str(&format!("title: {}\n", quote(&self.title)));
        if self.draft {
            out.push_str("draft: true\n");
        }
        out.push_str("---\n");
        out
    }
}

/// Double-quoted YAML scalar.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Header, blank line, body.
pub fn render_post(front_matter: &FrontMatter, body: &str) -> String {
    let body = body.trim_start_matches(['\n', '\r']);
    let mut out = front_matter.render();
    out.push('\n');
    out.push_str(body);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Decides what happens when a post's destination already exists.
pub trait OverwritePolicy {
    fn allow_overwrite(&mut self, path: &Path) -> bool;
}

/// `--force`
pub struct AlwaysOverwrite;

impl OverwritePolicy for AlwaysOverwrite {
    fn allow_overwrite(&mut self, _path: &Path) -> bool {
        true
    }
}

/// `--skip-existing`
pub struct NeverOverwrite;

impl OverwritePolicy for NeverOverwrite {
    fn allow_overwrite(&mut self, _path: &Path) -> bool {
        false
    }
}

/// Ask the operator. Anything but `y`/`yes` (including end of input) declines.
pub struct PromptOverwrite<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptOverwrite<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptOverwrite<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> OverwritePolicy for PromptOverwrite<R, W> {
    fn allow_overwrite(&mut self, path: &Path) -> bool {
        if write!(self.output, "{} exists. Overwrite? [y/N] ", path.display())
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Dry run: preview reported, nothing written.
    Previewed,
    Written,
    Overwritten,
    /// Destination existed and the policy declined.
    Declined,
}

/// Write `post` (or preview it in dry-run mode).
pub fn write_post(
    post: &BlogPost,
    dry_run: bool,
    policy: &mut dyn OverwritePolicy,
    reporter: &mut dyn Reporter,
) -> Result<WriteOutcome, WriteError> {
    let exists = post.path.exists();

    if dry_run {
        if exists {
            reporter.info(&format!(
                "{} exists and would need overwrite confirmation",
                post.path.display()
            ));
        }
        reporter.block(&format_preview(post));
        return Ok(WriteOutcome::Previewed);
    }

    if exists && !policy.allow_overwrite(&post.path) {
        reporter.warn(&format!("Skipped existing {}", post.path.display()));
        return Ok(WriteOutcome::Declined);
    }

    write_atomic(&post.path, &post.content)?;
    if exists {
        reporter.success(&format!("Overwrote {}", post.path.display()));
        Ok(WriteOutcome::Overwritten)
    } else {
        reporter.success(&format!("Wrote {}", post.path.display()));
        Ok(WriteOutcome::Written)
    }
}

/// Write to `.<name>.tmp` beside `path`, then rename over it.
fn write_atomic(path: &Path, content: &str) -> Result<(), WriteError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| WriteError::InvalidPath(path.to_path_buf()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&tmp, content).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(())
}
