//! Operator-facing output for the import pipeline.
//!
//! # Log Stream
//!
//! Every message is a single timestamped, categorized line:
//!
//! ```text
//! [14:02:11] INFO    Processing notes/My_Trip.md
//! [14:02:11] WARNING Image not found: notes/assets/missing.png
//! [14:02:11] SUCCESS Wrote src/content/blog/my-trip.mdx
//! [14:02:12] ERROR   notes/broken.md: stream did not contain valid UTF-8
//! ```
//!
//! `DEBUG` lines are only shown with `--verbose`.
//!
//! # Reporters
//!
//! Pipeline components never print. They hand messages to a [`Reporter`]:
//! the binary uses [`ConsoleReporter`]; tests use [`MemoryReporter`] and
//! assert on what was reported.
//!
//! # Architecture
//!
//! Formatting functions ([`format_line`], [`format_preview`],
//! [`format_summary`]) are pure and return strings; reporters only decide
//! where those strings go.

use crate::import::ImportSummary;
use crate::types::BlogPost;
use chrono::{Local, NaiveTime};
use owo_colors::{OwoColorize, Stream};

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

/// Sink for pipeline messages.
pub trait Reporter {
    /// Record one categorized message.
    fn report(&mut self, level: Level, message: &str);

    /// Emit untimestamped lines verbatim (dry-run previews).
    fn block(&mut self, lines: &[String]);

    fn debug(&mut self, message: &str) {
        self.report(Level::Debug, message);
    }

    fn info(&mut self, message: &str) {
        self.report(Level::Info, message);
    }

    fn success(&mut self, message: &str) {
        self.report(Level::Success, message);
    }

    fn warn(&mut self, message: &str) {
        self.report(Level::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.report(Level::Error, message);
    }
}

/// Format one log line. Labels are padded so messages line up.
pub fn format_line(time: NaiveTime, level: Level, message: &str) -> String {
    format!(
        "[{}] {:<7} {}",
        time.format("%H:%M:%S"),
        level.label(),
        message
    )
}

/// Prints to stdout with local-time timestamps and colored labels.
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, level: Level, message: &str) {
        if level == Level::Debug && !self.verbose {
            return;
        }
        let line = format_line(Local::now().time(), level, message);
        let line = line.if_supports_color(Stream::Stdout, |l| match level {
            Level::Debug => l.dimmed().to_string(),
            Level::Info => l.to_string(),
            Level::Success => l.bright_green().to_string(),
            Level::Warning => l.bright_yellow().to_string(),
            Level::Error => l.bright_red().bold().to_string(),
        });
        println!("{line}");
    }

    fn block(&mut self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

/// Collects everything reported, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub messages: Vec<(Level, String)>,
    pub blocks: Vec<String>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages reported at `level`, in order.
    pub fn at(&self, level: Level) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.at(Level::Warning)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.at(Level::Error)
    }

    /// True if any message at `level` contains `needle`.
    pub fn has(&self, level: Level, needle: &str) -> bool {
        self.at(level).iter().any(|m| m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, level: Level, message: &str) {
        self.messages.push((level, message.to_string()));
    }

    fn block(&mut self, lines: &[String]) {
        self.blocks.extend(lines.iter().cloned());
    }
}

/// Banner printed before anything else in dry-run mode.
pub const DRY_RUN_BANNER: &str = "DRY RUN: no changes will be made";

const PREVIEW_HEADER_LINES: usize = 16;
const PREVIEW_BODY_LINES: usize = 10;
const PREVIEW_LINE_CHARS: usize = 100;

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_line(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Format the dry-run preview of a post: destination, then the head of the
/// header and the head of the body.
///
/// ```text
/// Would write: src/content/blog/my-trip.mdx
///     ---
///     heroImage: "/assets/blog/photo.jpg"
///     ...
///     ---
///
///     A short trip recap.
///     ... (3 more lines)
/// ```
pub fn format_preview(post: &BlogPost) -> Vec<String> {
    let mut lines = vec![format!("Would write: {}", post.path.display())];

    let (header, body) = split_header(&post.content);
    push_truncated(&mut lines, header, PREVIEW_HEADER_LINES);
    lines.push("    ".to_string());
    push_truncated(&mut lines, body, PREVIEW_BODY_LINES);
    lines
}

fn push_truncated(lines: &mut Vec<String>, text: &str, max_lines: usize) {
    let all: Vec<&str> = text.lines().collect();
    for line in all.iter().take(max_lines) {
        lines.push(format!("    {}", truncate_line(line, PREVIEW_LINE_CHARS)));
    }
    if all.len() > max_lines {
        lines.push(format!("    ... ({} more lines)", all.len() - max_lines));
    }
}

/// Split rendered post content at the blank line after the closing `---`.
fn split_header(content: &str) -> (&str, &str) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return ("", content);
    };
    match rest.find("\n---\n") {
        Some(pos) => {
            let end = 4 + pos + 5;
            (
                &content[..end],
                content[end..].trim_start_matches('\n'),
            )
        }
        None => (content, ""),
    }
}

/// Format the end-of-batch summary.
///
/// ```text
/// Discovered 12 documents: 10 processed, 1 skipped, 1 failed
/// ```
pub fn format_summary(summary: &ImportSummary) -> String {
    let noun = if summary.discovered == 1 {
        "document"
    } else {
        "documents"
    };
    format!(
        "Discovered {} {}: {} processed, {} skipped, {} failed",
        summary.discovered, noun, summary.processed, summary.skipped, summary.failed
    )
}
