//! The fixed set of post categories and validation against it.
//!
//! Mapping a note's own tags onto a category happens before this point (see
//! [`metadata::requested_category`](crate::metadata::requested_category)).
//! This module only checks that the requested value is one of the allowed
//! names, falling back to [`Category::Journal`] with a warning otherwise.

use crate::output::Reporter;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    #[default]
    Journal,
    Coding,
    Music,
    Photography,
    Crypto,
    History,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Journal,
        Category::Coding,
        Category::Music,
        Category::Photography,
        Category::Crypto,
        Category::History,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Journal => "Journal",
            Category::Coding => "Coding",
            Category::Music => "Music",
            Category::Photography => "Photography",
            Category::Crypto => "Crypto",
            Category::History => "History",
        }
    }

    /// Exact, case-sensitive match against the allowed names.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Comma-separated list of allowed names, for messages.
    pub fn allowed_list() -> String {
        Self::ALL.map(Category::as_str).join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a requested category, falling back to `Journal` with a warning.
pub fn resolve_category(requested: &str, reporter: &mut dyn Reporter) -> Category {
    match Category::parse(requested) {
        Some(category) => category,
        None => {
            reporter.warn(&format!(
                "Invalid category '{}' (allowed: {}), using {}",
                requested,
                Category::allowed_list(),
                Category::Journal
            ));
            Category::Journal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryReporter;

    #[test]
    fn every_allowed_name_resolves_to_itself() {
        let mut reporter = MemoryReporter::new();
        for category in Category::ALL {
            assert_eq!(resolve_category(category.as_str(), &mut reporter), category);
        }
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn unknown_name_falls_back_to_journal_with_warning() {
        let mut reporter = MemoryReporter::new();
        assert_eq!(resolve_category("Cooking", &mut reporter), Category::Journal);

        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'Cooking'"));
        assert!(warnings[0].contains("Journal, Coding, Music, Photography, Crypto, History"));
    }

    #[test]
    fn match_is_case_sensitive() {
        let mut reporter = MemoryReporter::new();
        assert_eq!(resolve_category("coding", &mut reporter), Category::Journal);
        assert!(reporter.warnings()[0].contains("'coding'"));
    }

    #[test]
    fn empty_name_is_invalid() {
        let mut reporter = MemoryReporter::new();
        assert_eq!(resolve_category("", &mut reporter), Category::Journal);
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Category::Photography.to_string(), "Photography");
        assert_eq!(Category::default(), Category::Journal);
    }
}
