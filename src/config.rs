//! Run configuration.
//!
//! A [`RunConfig`] is built once per invocation from three layers, lowest to
//! highest precedence:
//!
//! ```text
//! 1. stock defaults        RunConfig::default()
//! 2. config file           ./notepress.conf (or --config <path>), optional
//! 3. command-line flags    only the flags actually given
//! ```
//!
//! Each layer is turned into a `toml::Value` table and the tables are merged
//! key-by-key with [`merge_toml`] before a single deserialize + validate. The
//! resulting value is read-only for the rest of the run and passed by
//! reference to every stage.
//!
//! ## Config File Format
//!
//! Shell-style `KEY=value` assignments, so the same file can be `source`d by
//! other scripts:
//!
//! ```sh
//! # Where posts and images go
//! POSTS_DIR=src/content/blog
//! ASSETS_DIR=public/assets/blog
//!
//! DEFAULT_CATEGORY=Journal
//! DEFAULT_DRAFT=false
//! DEFAULT_TAGS="imported, notes"
//! CATEGORY_MAP="programming:Coding,guitar:Music"
//! TAG_MAP='js:javascript'
//! export EXCLUDE_PATTERN='^(Untitled|draft-)'
//! ```
//!
//! - Keys are case-insensitive; unknown keys are ignored.
//! - Values may be bare, `'single'` or `"double"` quoted (`\"` and `\\`
//!   escapes inside double quotes).
//! - Lists are comma-separated; maps are comma-separated `from:to` pairs.
//! - A line that is not an assignment, or an unterminated quote, is an error.
//!
//! Run `notepress gen-config` for a commented stock file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "notepress.conf";

/// Configuration for one import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Category requested for every post unless a tag maps to another one.
    pub default_category: String,
    /// Mark posts as drafts.
    pub default_draft: bool,
    /// Hero image used when a note has no usable image and the asset store is empty.
    pub default_hero_image: String,
    /// Tags added to every post, beyond the tags found in the note.
    pub default_tags: Vec<String>,
    /// Note tag → category name.
    pub category_map: BTreeMap<String, String>,
    /// Note tag → replacement tag.
    pub tag_map: BTreeMap<String, String>,
    /// Only import notes whose filename matches this regex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_pattern: Option<String>,
    /// Skip notes whose filename matches this regex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_pattern: Option<String>,
    /// Analyze and report, but write nothing.
    pub dry_run: bool,
    /// Show debug-level messages.
    pub verbose: bool,
    /// Directory posts are written to. Must exist.
    pub posts_dir: PathBuf,
    /// Directory images are copied to. Must exist.
    pub assets_dir: PathBuf,
    /// URL path under which `assets_dir` is served.
    pub asset_url_prefix: String,
    /// Extension of written posts, without the dot.
    pub post_extension: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_category: "Journal".to_string(),
            default_draft: false,
            default_hero_image: "/assets/blog/default-hero.jpg".to_string(),
            default_tags: Vec::new(),
            category_map: BTreeMap::new(),
            tag_map: BTreeMap::new(),
            include_pattern: None,
            exclude_pattern: None,
            dry_run: false,
            verbose: false,
            posts_dir: PathBuf::from("src/content/blog"),
            assets_dir: PathBuf::from("public/assets/blog"),
            asset_url_prefix: "/assets/blog".to_string(),
            post_extension: "mdx".to_string(),
        }
    }
}

impl RunConfig {
    /// Validate values that deserialization alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, pattern) in [
            ("include_pattern", &self.include_pattern),
            ("exclude_pattern", &self.exclude_pattern),
        ] {
            if let Some(p) = pattern
                && let Err(e) = Regex::new(p)
            {
                return Err(ConfigError::Validation(format!(
                    "{key} is not a valid regular expression: {e}"
                )));
            }
        }
        let ext = &self.post_extension;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "post_extension must be a bare extension like \"mdx\", got {ext:?}"
            )));
        }
        if self.asset_url_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "asset_url_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Asset URL prefix without a trailing slash.
    pub fn asset_prefix(&self) -> &str {
        self.asset_url_prefix.trim_end_matches('/')
    }
}

/// Values given explicitly on the command line.
///
/// `None` (or `false` for switches) means "not given" and leaves lower
/// layers untouched.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub category: Option<String>,
    pub draft: bool,
    pub hero_image: Option<String>,
    /// Comma-separated, as typed.
    pub tags: Option<String>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
    pub posts_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
}

impl CliOverrides {
    /// The overrides as a sparse TOML table.
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::Table::new();
        let mut set = |key: &str, value: toml::Value| {
            table.insert(key.to_string(), value);
        };
        if let Some(c) = &self.category {
            set("default_category", toml::Value::String(c.clone()));
        }
        if self.draft {
            set("default_draft", toml::Value::Boolean(true));
        }
        if let Some(h) = &self.hero_image {
            set("default_hero_image", toml::Value::String(h.clone()));
        }
        if let Some(t) = &self.tags {
            set("default_tags", list_value(t));
        }
        if let Some(p) = &self.include {
            set("include_pattern", toml::Value::String(p.clone()));
        }
        if let Some(p) = &self.exclude {
            set("exclude_pattern", toml::Value::String(p.clone()));
        }
        if self.dry_run {
            set("dry_run", toml::Value::Boolean(true));
        }
        if self.verbose {
            set("verbose", toml::Value::Boolean(true));
        }
        if let Some(d) = &self.posts_dir {
            set("posts_dir", path_value(d));
        }
        if let Some(d) = &self.assets_dir {
            set("assets_dir", path_value(d));
        }
        toml::Value::Table(table)
    }
}

// =============================================================================
// Config file parsing
// =============================================================================

#[derive(Clone, Copy)]
enum FieldKind {
    Text,
    Flag,
    List,
    Map,
}

/// Keys the config file understands, as `RunConfig` field names.
const FIELDS: &[(&str, FieldKind)] = &[
    ("default_category", FieldKind::Text),
    ("default_draft", FieldKind::Flag),
    ("default_hero_image", FieldKind::Text),
    ("default_tags", FieldKind::List),
    ("category_map", FieldKind::Map),
    ("tag_map", FieldKind::Map),
    ("include_pattern", FieldKind::Text),
    ("exclude_pattern", FieldKind::Text),
    ("dry_run", FieldKind::Flag),
    ("verbose", FieldKind::Flag),
    ("posts_dir", FieldKind::Text),
    ("assets_dir", FieldKind::Text),
    ("asset_url_prefix", FieldKind::Text),
    ("post_extension", FieldKind::Text),
];

fn field_kind(key: &str) -> Option<FieldKind> {
    FIELDS.iter().find(|(k, _)| *k == key).map(|(_, kind)| *kind)
}

fn list_value(raw: &str) -> toml::Value {
    toml::Value::Array(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| toml::Value::String(s.to_string()))
            .collect(),
    )
}

fn path_value(path: &Path) -> toml::Value {
    toml::Value::String(path.to_string_lossy().into_owned())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

fn parse_map(raw: &str) -> Result<toml::Value, String> {
    let mut table = toml::Table::new();
    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((from, to)) = pair.split_once(':') else {
            return Err(format!("expected from:to pair, got {pair:?}"));
        };
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(format!("expected from:to pair, got {pair:?}"));
        }
        table.insert(from.to_lowercase(), toml::Value::String(to.to_string()));
    }
    Ok(toml::Value::Table(table))
}

/// Split one line into a key and an unquoted value.
///
/// Returns `Ok(None)` for blank lines and comments.
fn parse_assignment(line: &str) -> Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
    let Some((key, raw)) = line.split_once('=') else {
        return Err(format!("expected KEY=value, got {line:?}"));
    };
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid key {key:?}"));
    }
    let value = unquote(raw.trim())?;
    Ok(Some((key.to_ascii_lowercase(), value)))
}

fn unquote(raw: &str) -> Result<String, String> {
    match raw.chars().next() {
        Some('"') => {
            let mut value = String::new();
            let mut escaped = false;
            for (i, c) in raw.char_indices().skip(1) {
                if escaped {
                    if !matches!(c, '"' | '\\' | '$' | '`') {
                        value.push('\\');
                    }
                    value.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    return trailing_comment(&raw[i + 1..]).map(|()| value);
                } else {
                    value.push(c);
                }
            }
            Err("unterminated double quote".to_string())
        }
        Some('\'') => match raw[1..].find('\'') {
            Some(end) => trailing_comment(&raw[end + 2..]).map(|()| raw[1..end + 1].to_string()),
            None => Err("unterminated single quote".to_string()),
        },
        _ => {
            let value = match raw.find(" #") {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            Ok(value.trim().to_string())
        }
    }
}

/// Only whitespace or a `# comment` may follow a closing quote.
fn trailing_comment(rest: &str) -> Result<(), String> {
    let rest = rest.trim();
    if rest.is_empty() || rest.starts_with('#') {
        Ok(())
    } else {
        Err(format!("unexpected text after closing quote: {rest:?}"))
    }
}

/// Parse a shell-style config file into a sparse TOML table.
///
/// Unknown keys are skipped. `path` is only used in error messages.
pub fn parse_config_file(content: &str, path: &Path) -> Result<toml::Value, ConfigError> {
    let err = |line: usize, message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut table = toml::Table::new();
    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;
        let Some((key, value)) = parse_assignment(line).map_err(|m| err(lineno, m))? else {
            continue;
        };
        let Some(kind) = field_kind(&key) else {
            continue;
        };
        let parsed = match kind {
            FieldKind::Text => toml::Value::String(value),
            FieldKind::List => list_value(&value),
            FieldKind::Flag => match parse_flag(&value) {
                Some(b) => toml::Value::Boolean(b),
                None => {
                    return Err(err(
                        lineno,
                        format!("{} must be true or false, got {value:?}", key.to_uppercase()),
                    ));
                }
            },
            FieldKind::Map => parse_map(&value).map_err(|m| err(lineno, m))?,
        };
        table.insert(key, parsed);
    }
    Ok(toml::Value::Table(table))
}

// =============================================================================
// Layering
// =============================================================================

/// Returns the stock defaults as a `toml::Value::Table`, the base layer for
/// merging overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RunConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw overlay.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_file(&content, path).map(Some)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<RunConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: RunConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Build the run configuration: defaults < config file < CLI flags.
///
/// `config_path` of `None` means [`DEFAULT_CONFIG_FILE`] in the working
/// directory. A missing file is skipped silently.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<RunConfig, ConfigError> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let file_layer = load_raw_config(path)?;
    let overlays = file_layer.into_iter().chain(std::iter::once(cli.to_toml()));
    resolve_config(stock_defaults_value()?, overlays)
}

/// Returns a fully-commented stock config file with every key.
///
/// Used by the `gen-config` command.
pub fn stock_config() -> &'static str {
    r#"# notepress configuration
# =======================
#
# Shell-style KEY=value lines. Every key is optional; the values below are
# the built-in defaults. Command-line flags override anything set here.

# Directory posts are written to (must exist).
POSTS_DIR=src/content/blog

# Directory images are copied to (must exist).
ASSETS_DIR=public/assets/blog

# URL path the assets directory is served under. Rewritten image
# references and hero images point here.
ASSET_URL_PREFIX=/assets/blog

# Extension of written posts.
POST_EXTENSION=mdx

# One of: Journal, Coding, Music, Photography, Crypto, History.
# Anything else falls back to Journal with a warning.
DEFAULT_CATEGORY=Journal

# Mark imported posts as drafts.
DEFAULT_DRAFT=false

# Hero image used when a note has no usable image and the asset
# directory is empty.
DEFAULT_HERO_IMAGE=/assets/blog/default-hero.jpg

# Comma-separated tags added to every post.
DEFAULT_TAGS=

# Comma-separated note-tag:Category pairs. The first tag in a note with
# an entry here picks the post category.
#   CATEGORY_MAP="programming:Coding,guitar:Music"
CATEGORY_MAP=

# Comma-separated note-tag:new-tag pairs applied to tags found in notes.
#   TAG_MAP="js:javascript,rust-lang:rust"
TAG_MAP=

# Regular expressions matched against note filenames when importing a
# directory. Leave unset to import everything.
#   INCLUDE_PATTERN='^2024'
#   EXCLUDE_PATTERN='^(Untitled|draft-)'

# Analyze and report without writing anything.
DRY_RUN=false

# Show debug output.
VERBOSE=false
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<toml::Value, ConfigError> {
        parse_config_file(content, Path::new("test.conf"))
    }

    fn resolve(content: &str) -> RunConfig {
        let overlay = parse(content).unwrap();
        resolve_config(stock_defaults_value().unwrap(), [overlay]).unwrap()
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn default_config_values() {
        let config = RunConfig::default();
        assert_eq!(config.default_category, "Journal");
        assert!(!config.default_draft);
        assert!(!config.dry_run);
        assert_eq!(config.post_extension, "mdx");
        assert_eq!(config.asset_url_prefix, "/assets/blog");
        assert!(config.default_tags.is_empty());
    }

    #[test]
    fn default_config_validates() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn stock_defaults_value_is_table() {
        assert!(stock_defaults_value().unwrap().is_table());
    }

    // =========================================================================
    // Line parsing
    // =========================================================================

    #[test]
    fn bare_value() {
        let config = resolve("DEFAULT_CATEGORY=Coding\n");
        assert_eq!(config.default_category, "Coding");
    }

    #[test]
    fn double_quoted_value_with_escapes() {
        let config = resolve(r#"DEFAULT_HERO_IMAGE="/img/a \"b\".jpg""#);
        assert_eq!(config.default_hero_image, r#"/img/a "b".jpg"#);
    }

    #[test]
    fn single_quoted_value_is_literal() {
        let config = resolve(r"EXCLUDE_PATTERN='^draft-\d+'");
        assert_eq!(config.exclude_pattern.as_deref(), Some(r"^draft-\d+"));
    }

    #[test]
    fn export_prefix_and_lowercase_keys() {
        let config = resolve("export default_draft=yes\n");
        assert!(config.default_draft);
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let config = resolve("# comment\n\n   \nDEFAULT_CATEGORY=Music # trailing\n");
        assert_eq!(config.default_category, "Music");
    }

    #[test]
    fn comment_after_quoted_value() {
        let config = resolve("DEFAULT_CATEGORY=\"History\"  # note\n");
        assert_eq!(config.default_category, "History");
    }

    #[test]
    fn unknown_keys_ignored() {
        let config = resolve("SOME_OTHER_SETTING=1\nPHOTO_DIR=/tmp\n");
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn list_value_trims_and_drops_empties() {
        let config = resolve("DEFAULT_TAGS=\" imported , notes,, \"\n");
        assert_eq!(config.default_tags, vec!["imported", "notes"]);
    }

    #[test]
    fn map_values() {
        let config = resolve("CATEGORY_MAP=\"Programming:Coding, guitar:Music\"\nTAG_MAP=js:javascript\n");
        assert_eq!(config.category_map.get("programming").unwrap(), "Coding");
        assert_eq!(config.category_map.get("guitar").unwrap(), "Music");
        assert_eq!(config.tag_map.get("js").unwrap(), "javascript");
    }

    #[test]
    fn line_without_equals_is_error() {
        let result = parse("DEFAULT_CATEGORY=Coding\nthis is not an assignment\n");
        match result {
            Err(ConfigError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_quote_is_error() {
        assert!(matches!(
            parse("DEFAULT_TAGS=\"a,b\n"),
            Err(ConfigError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse("DEFAULT_TAGS='a,b\n"),
            Err(ConfigError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn text_after_closing_quote_is_error() {
        assert!(matches!(
            parse("DEFAULT_CATEGORY=\"Coding\"extra\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_key_is_error() {
        assert!(matches!(
            parse("DEFAULT-CATEGORY=Coding\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_flag_is_error() {
        assert!(matches!(
            parse("DRY_RUN=maybe\n"),
            Err(ConfigError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_map_pair_is_error() {
        assert!(matches!(
            parse("CATEGORY_MAP=programming\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    // =========================================================================
    // Layering
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[m]\nx = \"1\"\ny = \"2\"").unwrap();
        let overlay: toml::Value = toml::from_str("[m]\ny = \"3\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["m"]["x"].as_str(), Some("1"));
        assert_eq!(merged["m"]["y"].as_str(), Some("3"));
    }

    #[test]
    fn cli_overrides_config_file() {
        let file = parse("DEFAULT_CATEGORY=Music\nDEFAULT_TAGS=a,b\nDEFAULT_DRAFT=true\n").unwrap();
        let cli = CliOverrides {
            category: Some("Coding".into()),
            ..Default::default()
        };
        let config =
            resolve_config(stock_defaults_value().unwrap(), [file, cli.to_toml()]).unwrap();
        assert_eq!(config.default_category, "Coding");
        assert_eq!(config.default_tags, vec!["a", "b"]);
        assert!(config.default_draft);
    }

    #[test]
    fn empty_cli_overrides_change_nothing() {
        assert_eq!(CliOverrides::default().to_toml(), toml::Value::Table(toml::Table::new()));
    }

    #[test]
    fn cli_tags_are_split() {
        let cli = CliOverrides {
            tags: Some(" travel, ,photos ".into()),
            dry_run: true,
            ..Default::default()
        };
        let config = resolve_config(stock_defaults_value().unwrap(), [cli.to_toml()]).unwrap();
        assert_eq!(config.default_tags, vec!["travel", "photos"]);
        assert!(config.dry_run);
    }

    #[test]
    fn invalid_pattern_rejected() {
        let overlay = parse("INCLUDE_PATTERN='(unclosed'\n").unwrap();
        let result = resolve_config(stock_defaults_value().unwrap(), [overlay]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn invalid_extension_rejected() {
        let overlay = parse("POST_EXTENSION=.md\n").unwrap();
        let result = resolve_config(stock_defaults_value().unwrap(), [overlay]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn asset_prefix_trims_trailing_slash() {
        let config = resolve("ASSET_URL_PREFIX=/images/\n");
        assert_eq!(config.asset_prefix(), "/images");
    }

    // =========================================================================
    // load_config
    // =========================================================================

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(
            Some(&tmp.path().join("missing.conf")),
            &CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notepress.conf");
        fs::write(&path, "DEFAULT_CATEGORY=Photography\nPOSTS_DIR=out/posts\n").unwrap();

        let config = load_config(Some(&path), &CliOverrides::default()).unwrap();
        assert_eq!(config.default_category, "Photography");
        assert_eq!(config.posts_dir, PathBuf::from("out/posts"));
    }

    #[test]
    fn load_config_malformed_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notepress.conf");
        fs::write(&path, "not valid\n").unwrap();

        let result = load_config(Some(&path), &CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_parses_to_defaults() {
        let overlay = parse(stock_config()).unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), [overlay]).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn stock_config_mentions_every_key() {
        let stock = stock_config();
        for (key, _) in FIELDS {
            assert!(
                stock.contains(&key.to_uppercase()),
                "stock config missing {key}"
            );
        }
    }
}
