//! Shared test utilities.
//!
//! [`Workspace`] lays out a throwaway export plus blog tree:
//!
//! ```text
//! <tmp>/
//! ├── export/               # notes go here (Workspace::note)
//! └── blog/
//!     ├── src/content/blog/ # posts_dir
//!     └── public/assets/blog/ # assets_dir
//! ```
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let ws = Workspace::new();
//! ws.note("pages/My_Trip.md", "# My Trip\n\nRecap.");
//! let config = ws.config();
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::RunConfig;

/// Publish timestamp used by tests: 2024-01-15T10:30:00Z.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

pub struct Workspace {
    tmp: TempDir,
    pub notes: PathBuf,
    pub posts: PathBuf,
    pub assets: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let notes = tmp.path().join("export");
        let posts = tmp.path().join("blog/src/content/blog");
        let assets = tmp.path().join("blog/public/assets/blog");
        for dir in [&notes, &posts, &assets] {
            fs::create_dir_all(dir).unwrap();
        }
        Self {
            tmp,
            notes,
            posts,
            assets,
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Write a note under the export dir, creating parents.
    pub fn note(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.notes.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Stock config pointed at this workspace's destinations.
    pub fn config(&self) -> RunConfig {
        RunConfig {
            posts_dir: self.posts.clone(),
            assets_dir: self.assets.clone(),
            ..RunConfig::default()
        }
    }
}
