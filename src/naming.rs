//! Filename conventions for post sources.
//!
//! Every post lives in a single directory as `<slug>.<ext>`. The filename stem
//! is the public identifier: it is the URL key for the post page and the JSON
//! API, and it never comes from front matter. This module derives the slug and
//! the fallback display title from a path, and decides which slugs are safe to
//! resolve back to a file.
//!
//! ## Display Titles
//!
//! When a post has no `title` in its front matter, the stem is humanized:
//! underscores become spaces and every word is capitalized.
//!
//! - `hello_world.md` → "Hello World"
//! - `rust_2024_roadmap.md` → "Rust 2024 Roadmap"
//! - `GETTING_started.md` → "Getting Started"

use std::path::Path;

/// Result of parsing a post filename like `my_first_post.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Filename stem, unchanged. This is the post slug.
    pub slug: String,
    /// Humanized stem used when front matter has no title.
    pub display_title: String,
}

/// Parse a post path into its slug and fallback display title.
///
/// Returns `None` for paths without a usable stem (`/`, `..`, empty names).
///
/// - `"blog_src/hello_world.md"` → slug="hello_world", display_title="Hello World"
/// - `"blog_src/notes.md"` → slug="notes", display_title="Notes"
/// - `"blog_src/v1.2_release.md"` → slug="v1.2_release", display_title="V1.2 Release"
pub fn parse_post_name(path: &Path) -> Option<ParsedName> {
    let stem = path.file_stem()?.to_string_lossy().to_string();
    if stem.is_empty() {
        return None;
    }
    Some(ParsedName {
        display_title: humanize(&stem),
        slug: stem,
    })
}

/// Turn a filename stem into a display title.
///
/// Underscores become spaces; each word gets an uppercase first letter and
/// lowercase remainder. A word starts after whitespace or a dash, so
/// `"follow-up_notes"` becomes "Follow-Up Notes".
pub fn humanize(stem: &str) -> String {
    let spaced = stem.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if c.is_whitespace() || c == '-' {
            out.push(c);
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Whether a requested slug may be resolved against the source directory.
///
/// Slugs are filename stems, never paths: anything that could walk out of
/// the source directory is refused.
pub fn is_resolvable_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
        && slug != ".."
}

/// Whether `path` carries the post extension (compared case-insensitively).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
