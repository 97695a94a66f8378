//! Batch import: notes in, posts out.
//!
//! ## Per-Document Flow
//!
//! ```text
//! load ─→ title / description / tags ─→ category ─→ slug
//!                                                    │
//!         write ←─ render header + body ←─ normalize ←─ hero image
//! ```
//!
//! ## Failure Isolation
//!
//! Before touching any note the run checks its prerequisites: the config is
//! valid, the input exists, and both destination directories exist. Any of
//! those failing aborts the run with an [`ImportError`] and nothing written.
//!
//! After that, each note stands alone. A note that cannot be read, whose
//! image cannot be copied, or whose post cannot be written is reported,
//! counted as failed, and the batch moves on. A declined overwrite counts as
//! skipped.
//!
//! ## Shared State
//!
//! One [`AssetStore`] serves the whole batch, so two notes referencing
//! different images with the same file name get distinct destination names
//! even in dry-run mode.

use crate::category::resolve_category;
use crate::config::{ConfigError, RunConfig};
use crate::images::{AssetStore, ImageError, select_hero};
use crate::metadata::{extract, requested_category};
use crate::naming::post_slug;
use crate::normalize::normalize;
use crate::output::{DRY_RUN_BANNER, Reporter, format_summary};
use crate::post::{FrontMatter, OverwritePolicy, WriteError, WriteOutcome, render_post, write_post};
use crate::scan::{FileFilter, ScanError, scan};
use crate::types::{BlogPost, ExtractedMetadata, SourceDocument};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop the whole run before any note is processed.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Input not found: {0}")]
    MissingInput(PathBuf),
    #[error("{what} directory not found: {path}")]
    MissingDestination { what: &'static str, path: PathBuf },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Errors confined to one note.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub discovered: usize,
    /// Written, overwritten, or previewed.
    pub processed: usize,
    /// Overwrite declined.
    pub skipped: usize,
    pub failed: usize,
}

/// Collaborators injected into a run.
pub struct ImportContext<'a> {
    pub policy: &'a mut dyn OverwritePolicy,
    pub reporter: &'a mut dyn Reporter,
    /// Picks the fallback hero image.
    pub rng: &'a mut dyn RngCore,
    /// Publish timestamp source.
    pub clock: &'a dyn Fn() -> DateTime<Utc>,
}

/// Import every note under `input`.
pub fn run_import(
    config: &RunConfig,
    input: &Path,
    ctx: &mut ImportContext,
) -> Result<ImportSummary, ImportError> {
    if config.dry_run {
        ctx.reporter.warn(DRY_RUN_BANNER);
    }
    check_prerequisites(config, input)?;

    let filter = FileFilter::new(
        config.include_pattern.as_deref(),
        config.exclude_pattern.as_deref(),
    )?;
    let candidates = scan(input, &filter)?;
    let mut store = AssetStore::new(&config.assets_dir, config.asset_prefix(), config.dry_run);
    let mut summary = ImportSummary::default();

    for candidate in candidates {
        summary.discovered += 1;
        let path = match candidate {
            Ok(path) => path,
            Err(e) => {
                ctx.reporter.error(&e.to_string());
                summary.failed += 1;
                continue;
            }
        };

        ctx.reporter.info(&format!("Processing {}", path.display()));
        match process_document(&path, config, &mut store, ctx) {
            Ok(WriteOutcome::Declined) => summary.skipped += 1,
            Ok(_) => summary.processed += 1,
            Err(e) => {
                ctx.reporter.error(&format!("{}: {e}", path.display()));
                summary.failed += 1;
            }
        }
    }

    ctx.reporter.info(&format_summary(&summary));
    Ok(summary)
}

fn check_prerequisites(config: &RunConfig, input: &Path) -> Result<(), ImportError> {
    config.validate()?;
    if !input.exists() {
        return Err(ImportError::MissingInput(input.to_path_buf()));
    }
    for (what, dir) in [("Posts", &config.posts_dir), ("Assets", &config.assets_dir)] {
        if !dir.is_dir() {
            return Err(ImportError::MissingDestination {
                what,
                path: dir.clone(),
            });
        }
    }
    Ok(())
}

/// Turn one note into one post.
pub fn process_document(
    path: &Path,
    config: &RunConfig,
    store: &mut AssetStore,
    ctx: &mut ImportContext,
) -> Result<WriteOutcome, DocumentError> {
    let doc = SourceDocument::load(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let fields = extract(&doc, config);
    let requested = requested_category(
        &fields.content_tags,
        &config.default_category,
        &config.category_map,
    );
    let category = resolve_category(&requested, ctx.reporter);
    let hero_image = select_hero(
        &doc.content,
        &doc.dir,
        store,
        &config.default_hero_image,
        ctx.rng,
        ctx.reporter,
    )?;

    let metadata = ExtractedMetadata {
        slug: post_slug(&fields.title, &doc.content),
        title: fields.title,
        description: fields.description,
        tags: fields.tags,
        category,
        hero_image,
    };
    ctx.reporter.debug(&format!(
        "title={:?} slug={} category={} tags=[{}]",
        metadata.title,
        metadata.slug,
        metadata.category,
        metadata.tags.join(", ")
    ));

    let body = normalize(&doc.content, &doc.dir, store, ctx.reporter)?;
    let front_matter = FrontMatter {
        hero_image: metadata.hero_image,
        category: metadata.category.to_string(),
        description: metadata.description,
        pub_date: (ctx.clock)(),
        tags: metadata.tags,
        title: metadata.title,
        draft: config.default_draft,
    };
    let post = BlogPost {
        path: config
            .posts_dir
            .join(format!("{}.{}", metadata.slug, config.post_extension)),
        content: render_post(&front_matter, &body.text),
    };

    Ok(write_post(&post, config.dry_run, ctx.policy, ctx.reporter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Level, MemoryReporter};
    use crate::post::{AlwaysOverwrite, NeverOverwrite};
    use crate::test_helpers::{Workspace, fixed_time};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;

    fn run(
        config: &RunConfig,
        input: &Path,
        policy: &mut dyn OverwritePolicy,
    ) -> (Result<ImportSummary, ImportError>, MemoryReporter) {
        let mut reporter = MemoryReporter::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = ImportContext {
            policy,
            reporter: &mut reporter,
            rng: &mut rng,
            clock: &fixed_time,
        };
        let result = run_import(config, input, &mut ctx);
        (result, reporter)
    }

    #[test]
    fn imports_directory_of_notes() {
        let ws = Workspace::new();
        ws.note("pages/First.md", "# First Post\n\nHello.");
        ws.note("pages/Second.md", "# Second Post\n\nWorld.");

        let (result, reporter) = run(&ws.config(), &ws.notes, &mut NeverOverwrite);
        let summary = result.unwrap();

        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.processed, 2);
        assert!(ws.posts.join("first-post.mdx").exists());
        assert!(ws.posts.join("second-post.mdx").exists());
        assert!(reporter.has(Level::Info, "Discovered 2 documents: 2 processed"));
    }

    #[test]
    fn single_file_input() {
        let ws = Workspace::new();
        let note = ws.note("pages/Solo.md", "# Solo\n\nJust me.");
        ws.note("pages/Other.md", "# Other\n\nIgnored.");

        let (result, _) = run(&ws.config(), &note, &mut NeverOverwrite);
        assert_eq!(result.unwrap().discovered, 1);
        assert!(!ws.posts.join("other.mdx").exists());
    }

    #[test]
    fn missing_input_is_fatal() {
        let ws = Workspace::new();
        let (result, _) = run(&ws.config(), &ws.notes.join("nope"), &mut NeverOverwrite);
        assert!(matches!(result, Err(ImportError::MissingInput(_))));
    }

    #[test]
    fn missing_destination_is_fatal_before_processing() {
        let ws = Workspace::new();
        ws.note("a.md", "# A\n\nText.");
        let mut config = ws.config();
        config.posts_dir = ws.root().join("no-such-dir");

        let (result, reporter) = run(&config, &ws.notes, &mut NeverOverwrite);
        assert!(matches!(
            result,
            Err(ImportError::MissingDestination { what: "Posts", .. })
        ));
        assert!(!reporter.has(Level::Info, "Processing"));
    }

    #[test]
    fn invalid_pattern_is_fatal() {
        let ws = Workspace::new();
        let mut config = ws.config();
        config.exclude_pattern = Some("(".into());
        let (result, _) = run(&config, &ws.notes, &mut NeverOverwrite);
        assert!(matches!(result, Err(ImportError::Config(_))));
    }

    #[test]
    fn unreadable_note_does_not_abort_batch() {
        let ws = Workspace::new();
        ws.note("a-good.md", "# Good\n\nFine.");
        fs::write(ws.notes.join("b-bad.md"), [0xff, 0xfe, 0x00]).unwrap();
        ws.note("c-also-good.md", "# Also Good\n\nFine.");

        let (result, reporter) = run(&ws.config(), &ws.notes, &mut NeverOverwrite);
        let summary = result.unwrap();

        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert!(reporter.has(Level::Error, "b-bad.md"));
        assert!(ws.posts.join("also-good.mdx").exists());
    }

    #[test]
    fn declined_overwrite_counts_as_skipped() {
        let ws = Workspace::new();
        ws.note("trip.md", "# My Trip\n\nRecap.");
        fs::write(ws.posts.join("my-trip.mdx"), "keep me").unwrap();

        let (result, reporter) = run(&ws.config(), &ws.notes, &mut NeverOverwrite);
        let summary = result.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.failed, 0);
        assert!(reporter.errors().is_empty());
        assert_eq!(
            fs::read_to_string(ws.posts.join("my-trip.mdx")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn forced_overwrite_replaces() {
        let ws = Workspace::new();
        ws.note("trip.md", "# My Trip\n\nRecap.");
        fs::write(ws.posts.join("my-trip.mdx"), "old").unwrap();

        let (result, _) = run(&ws.config(), &ws.notes, &mut AlwaysOverwrite);
        assert_eq!(result.unwrap().processed, 1);
        let written = fs::read_to_string(ws.posts.join("my-trip.mdx")).unwrap();
        assert!(written.contains("title: \"My Trip\""));
    }

    #[test]
    fn category_map_and_tag_map_applied() {
        let ws = Workspace::new();
        ws.note("code.md", "# Code Notes\n\nSome text.\n\n#js #rust");
        let mut config = ws.config();
        config.tag_map.insert("js".into(), "javascript".into());
        config.category_map.insert("rust".into(), "Coding".into());

        let (result, reporter) = run(&config, &ws.notes, &mut NeverOverwrite);
        result.unwrap();

        let post = fs::read_to_string(ws.posts.join("code-notes.mdx")).unwrap();
        assert!(post.contains("category: Coding\n"));
        assert!(post.contains("  - \"javascript\"\n  - \"rust\"\n"));
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn invalid_category_falls_back_to_journal() {
        let ws = Workspace::new();
        ws.note("x.md", "# X\n\nText.");
        let mut config = ws.config();
        config.default_category = "Cooking".into();

        let (result, reporter) = run(&config, &ws.notes, &mut NeverOverwrite);
        assert_eq!(result.unwrap().processed, 1);
        let post = fs::read_to_string(ws.posts.join("x.mdx")).unwrap();
        assert!(post.contains("category: Journal\n"));
        assert!(reporter.has(Level::Warning, "Cooking"));
    }

    #[test]
    fn draft_and_configured_tags_in_header() {
        let ws = Workspace::new();
        ws.note("d.md", "# Draft Post\n\nBody.");
        let mut config = ws.config();
        config.default_draft = true;
        config.default_tags = vec!["imported".into(), " ".into()];

        run(&config, &ws.notes, &mut NeverOverwrite).0.unwrap();
        let post = fs::read_to_string(ws.posts.join("draft-post.mdx")).unwrap();
        assert!(post.contains("tags:\n  - \"imported\"\ntitle:"));
        assert!(post.contains("draft: true\n"));
        assert!(post.contains("pubDate: 2024-01-15T10:30:00.000Z\n"));
    }

    #[test]
    fn symbol_only_title_gets_hash_slug() {
        let ws = Workspace::new();
        ws.note("q.md", "# ???\n\nBody.");

        run(&ws.config(), &ws.notes, &mut NeverOverwrite).0.unwrap();
        let names: Vec<String> = fs::read_dir(&ws.posts)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("post-") && names[0].ends_with(".mdx"));
    }

    #[test]
    fn dry_run_banner_comes_first_and_nothing_written() {
        let ws = Workspace::new();
        ws.note("trip.md", "# Trip\n\nText.\n\n![p](photo.jpg)");
        fs::write(ws.notes.join("photo.jpg"), b"img").unwrap();
        let mut config = ws.config();
        config.dry_run = true;

        let (result, reporter) = run(&config, &ws.notes, &mut AlwaysOverwrite);
        assert_eq!(result.unwrap().processed, 1);
        assert_eq!(reporter.messages[0].1, DRY_RUN_BANNER);
        assert_eq!(fs::read_dir(&ws.posts).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&ws.assets).unwrap().count(), 0);
        assert!(reporter.blocks.iter().any(|l| l.contains("trip.mdx")));
    }
}
