//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the site root next to the post and template directories:
//!
//! ```text
//! site/
//! ├── config.toml              # Optional; overrides stock defaults
//! ├── blog_src/                # Posts: <slug>.md
//! │   ├── hello_world.md
//! │   └── release_notes.md
//! └── templates/               # Page templates with {{placeholder}} tokens
//!     ├── blog_template.html
//!     ├── blog_list_template.html
//!     └── tag_list_template.html
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "blog_src"      # Post directory, relative to the site root
//! templates_dir = "templates"  # Template directory, relative to the site root
//! extension = "md"             # Post file extension (matched case-insensitively)
//! default_author = "Anonymous" # Author when front matter has none
//! date_format = "%B %d, %Y"    # strftime format for displayed dates
//! latest_limit = 5             # Default size of the "latest posts" feed
//!
//! [templates]
//! document = "blog_template.html"
//! listing = "blog_list_template.html"
//! tag = "tag_list_template.html"
//!
//! [routes]
//! post = "/blog"               # Post page URL prefix: /blog/<slug>
//! tag = "/tag"                 # Tag page URL prefix: /tag/<tag>
//! listing = "/blogs"           # All-posts page
//!
//! [markdown]
//! smart_punctuation = true
//! permalinks = true
//! permalink_class = "toc-link"
//! permalink_title = "Link to this section"
//! permalink_symbol = "¶"
//! highlight_class = "highlight"
//! highlight = true
//! highlight_theme = "InspiredGitHub"
//!
//! [cards]
//! missing_description = "No description available."
//!
//! [processing]
//! max_threads = 4              # Max parallel loaders (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! default_author = "The Team"
//!
//! [routes]
//! post = "/posts"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::markup;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Post directory, relative to the site root.
    pub source_dir: String,
    /// Template directory, relative to the site root.
    pub templates_dir: String,
    /// Post file extension, without the dot.
    pub extension: String,
    /// Author shown when a post's front matter has none.
    pub default_author: String,
    /// chrono strftime format for human-readable dates.
    pub date_format: String,
    /// Default number of posts in the latest-posts feed.
    pub latest_limit: usize,
    /// Template file names inside `templates_dir`.
    pub templates: TemplateNames,
    /// URL prefixes used in generated links.
    pub routes: RoutesConfig,
    /// Markdown conversion options.
    pub markdown: MarkdownConfig,
    /// Listing card settings.
    pub cards: CardsConfig,
    /// Parallel loading settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: "blog_src".to_string(),
            templates_dir: "templates".to_string(),
            extension: "md".to_string(),
            default_author: "Anonymous".to_string(),
            date_format: "%B %d, %Y".to_string(),
            latest_limit: 5,
            templates: TemplateNames::default(),
            routes: RoutesConfig::default(),
            markdown: MarkdownConfig::default(),
            cards: CardsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(
                "extension must be a bare extension like \"md\"".into(),
            ));
        }
        if self.source_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source_dir must not be empty".into(),
            ));
        }
        if self.date_format.trim().is_empty()
            || StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::Validation(format!(
                "date_format {:?} is not a valid strftime format",
                self.date_format
            )));
        }
        for (key, prefix) in [
            ("routes.post", &self.routes.post),
            ("routes.tag", &self.routes.tag),
            ("routes.listing", &self.routes.listing),
        ] {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{key} must start with '/'"
                )));
            }
            if prefix.split('/').any(|segment| segment == "." || segment == "..") {
                return Err(ConfigError::Validation(format!(
                    "{key} must not contain '.' or '..' segments"
                )));
            }
        }
        if self.markdown.highlight && !markup::has_theme(&self.markdown.highlight_theme) {
            return Err(ConfigError::Validation(format!(
                "markdown.highlight_theme {:?} is not a bundled theme",
                self.markdown.highlight_theme
            )));
        }
        Ok(())
    }

    /// Absolute post directory for a site rooted at `root`.
    pub fn source_path(&self, root: &Path) -> PathBuf {
        root.join(&self.source_dir)
    }

    /// Absolute template directory for a site rooted at `root`.
    pub fn templates_path(&self, root: &Path) -> PathBuf {
        root.join(&self.templates_dir)
    }
}

/// Template file names, one per page kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateNames {
    /// Single post page.
    pub document: String,
    /// All-posts listing page.
    pub listing: String,
    /// Tag-filtered listing page.
    pub tag: String,
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            document: "blog_template.html".to_string(),
            listing: "blog_list_template.html".to_string(),
            tag: "tag_list_template.html".to_string(),
        }
    }
}

/// URL prefixes for generated links. No trailing slash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    pub post: String,
    pub tag: String,
    pub listing: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            post: "/blog".to_string(),
            tag: "/tag".to_string(),
            listing: "/blogs".to_string(),
        }
    }
}

/// Markdown conversion options for the bundled converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Curly quotes, en/em dashes and ellipses.
    pub smart_punctuation: bool,
    /// Append a permalink anchor to every heading.
    pub permalinks: bool,
    pub permalink_class: String,
    pub permalink_title: String,
    pub permalink_symbol: String,
    /// Class of the container wrapped around fenced code blocks.
    pub highlight_class: String,
    /// Highlight fenced code with inline styles when the language is known.
    pub highlight: bool,
    /// Bundled syntect theme used for highlighting.
    pub highlight_theme: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            smart_punctuation: true,
            permalinks: true,
            permalink_class: "toc-link".to_string(),
            permalink_title: "Link to this section".to_string(),
            permalink_symbol: "\u{b6}".to_string(),
            highlight_class: "highlight".to_string(),
            highlight: true,
            highlight_theme: "InspiredGitHub".to_string(),
        }
    }
}

/// Listing card settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardsConfig {
    /// Text shown on a card when the post has no description.
    pub missing_description: String,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            missing_description: "No description available.".to_string(),
        }
    }
}

/// Parallel loading settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel post loaders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# inkpost Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory holding the posts, relative to the site root.
# Every file named <slug>.<extension> in it (not recursive) is a post.
source_dir = "blog_src"

# Directory holding the page templates, relative to the site root.
templates_dir = "templates"

# Post file extension, matched case-insensitively.
extension = "md"

# Author shown when a post's front matter has no `author`.
default_author = "Anonymous"

# strftime format for dates shown on pages and cards.
date_format = "%B %d, %Y"

# Default number of posts returned by the latest-posts feed.
latest_limit = 5

# ---------------------------------------------------------------------------
# Templates (file names inside templates_dir)
# ---------------------------------------------------------------------------
[templates]
# Every page also gets {{listing_url}} (routes.listing) for navigation.
# Single post page. Placeholders: {{title}} {{author}} {{created_date}}
# {{modified_date}} {{description}} {{content}} {{toc}} {{tags}} {{slug}}
document = "blog_template.html"

# All-posts page. Placeholders: {{title}} {{header}} {{blog_cards}}
listing = "blog_list_template.html"

# Tag page. Placeholders: {{title}} {{header}} {{description}}
# {{blog_cards}} {{section_footer}}
tag = "tag_list_template.html"

# ---------------------------------------------------------------------------
# Link prefixes used in generated HTML
# ---------------------------------------------------------------------------
[routes]
post = "/blog"
tag = "/tag"
listing = "/blogs"

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
# Curly quotes, dashes and ellipses.
smart_punctuation = true

# Permalink anchor appended to every heading.
permalinks = true
permalink_class = "toc-link"
permalink_title = "Link to this section"
permalink_symbol = "¶"

# Class of the <div> wrapped around fenced code blocks.
highlight_class = "highlight"

# Syntax highlighting for fenced code with a known language, rendered as
# inline styles. Unknown languages keep a plain language-<lang> class.
highlight = true
# One of: InspiredGitHub, Solarized (dark), Solarized (light),
# base16-ocean.dark, base16-ocean.light, base16-eighties.dark,
# base16-mocha.dark
highlight_theme = "InspiredGitHub"

# ---------------------------------------------------------------------------
# Listing cards
# ---------------------------------------------------------------------------
[cards]
missing_description = "No description available."

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel post loaders.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.source_dir, "blog_src");
        assert_eq!(config.extension, "md");
        assert_eq!(config.default_author, "Anonymous");
        assert_eq!(config.date_format, "%B %d, %Y");
        assert_eq!(config.latest_limit, 5);
        assert_eq!(config.templates.document, "blog_template.html");
        assert_eq!(config.routes.tag, "/tag");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
default_author = "The Team"

[routes]
post = "/posts"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_author, "The Team");
        assert_eq!(config.routes.post, "/posts");
        // Defaults preserved
        assert_eq!(config.routes.tag, "/tag");
        assert_eq!(config.extension, "md");
    }

    #[test]
    fn source_and_template_paths_are_root_relative() {
        let config = SiteConfig::default();
        let root = Path::new("/srv/site");
        assert_eq!(config.source_path(root), Path::new("/srv/site/blog_src"));
        assert_eq!(config.templates_path(root), Path::new("/srv/site/templates"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.source_dir, "blog_src");
        assert_eq!(config.markdown.permalink_class, "toc-link");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
source_dir = "posts"

[markdown]
permalinks = false
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.source_dir, "posts");
        assert!(!config.markdown.permalinks);
        // Unspecified values are defaults
        assert!(config.markdown.smart_punctuation);
        assert_eq!(config.templates_dir, "templates");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[routes]
posts = "/p"
"#,
        )
        .unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("sourcedir = \"x\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "extension = \".md\"").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_extension() {
        let mut config = SiteConfig::default();
        config.extension = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_unknown_highlight_theme() {
        let mut config = SiteConfig::default();
        config.markdown.highlight_theme = "Neon Dreams".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("highlight_theme"));

        config.markdown.highlight = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_route_needs_leading_slash() {
        let mut config = SiteConfig::default();
        config.routes.tag = "tag".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("routes.tag"));
    }

    #[test]
    fn validate_rejects_bad_strftime() {
        let mut config = SiteConfig::default();
        config.date_format = "%Q".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_route_rejects_dot_segments() {
        let mut config = SiteConfig::default();
        config.routes.post = "/../blog".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_date_format() {
        let mut config = SiteConfig::default();
        config.date_format = "  ".to_string();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig { max_threads: None }), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_threads: Some(99999),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_threads: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[routes]
post = "/blog"
tag = "/tag"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[routes]
tag = "/topics"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let routes = merged.get("routes").unwrap();
        assert_eq!(routes.get("tag").unwrap().as_str(), Some("/topics"));
        assert_eq!(routes.get("post").unwrap().as_str(), Some("/blog"));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("latest_limit = 5").unwrap();
        let overlay: toml::Value = toml::from_str("latest_limit = 10").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("latest_limit").unwrap().as_integer(), Some(10));
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value().unwrap(), None).unwrap();
        assert_eq!(config.latest_limit, 5);
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str(
            r#"
[routes]
listing = "blogs"
"#,
        )
        .unwrap();
        let result = resolve_config(stock_defaults_value().unwrap(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.source_dir, defaults.source_dir);
        assert_eq!(config.date_format, defaults.date_format);
        assert_eq!(config.templates.tag, defaults.templates.tag);
        assert_eq!(config.markdown.permalink_symbol, defaults.markdown.permalink_symbol);
        assert_eq!(config.cards.missing_description, defaults.cards.missing_description);
        assert_eq!(config.processing.max_threads, None);
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[templates]", "[routes]", "[markdown]", "[cards]", "[processing]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }
}
