//! # Notepress
//!
//! Imports a Markdown notes export into a static blog. Each note becomes
//! one post: a front matter header derived from the note (title,
//! description, tags, category, hero image) followed by the cleaned-up body,
//! with every image the note references copied into the blog's asset
//! directory and its reference rewritten.
//!
//! # Pipeline
//!
//! ```text
//! notes/  ──scan──→  note  ──extract──→  metadata ─┐
//!                     │                            ├──→  <slug>.mdx
//!                     └──normalize + images──→ body┘
//!                                    │
//!                                    └──→  public/assets/blog/
//! ```
//!
//! Notes are processed one at a time in scan order. A note that fails is
//! reported and counted; it never stops the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Defaults, `notepress.conf`, and CLI flags merged into one [`config::RunConfig`] |
//! | [`scan`] | Finds notes under the input path, applying include/exclude patterns |
//! | [`metadata`] | Title, description, and tags from a note's text |
//! | [`naming`] | Slugs from titles, titles from filenames |
//! | [`category`] | The fixed category set and fallback |
//! | [`images`] | Image lookup, asset store copies, reference rewriting, hero selection |
//! | [`normalize`] | Body cleanup stages |
//! | [`post`] | Header rendering, overwrite policies, atomic writes |
//! | [`import`] | Runs the pipeline over a batch and counts outcomes |
//! | [`output`] | Timestamped operator log, dry-run preview, summary |
//! | [`types`] | Shared data model |
//!
//! # Dry Run
//!
//! With `--dry-run` every stage still runs (images are located, names are
//! chosen, headers rendered) but nothing is copied or written. The asset
//! store tracks the names it would have used, so the preview shows exactly
//! what a real run would produce.

pub mod category;
pub mod config;
pub mod images;
pub mod import;
pub mod metadata;
pub mod naming;
pub mod normalize;
pub mod output;
pub mod post;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
