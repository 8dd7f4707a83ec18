//! Shared test utilities for the inkpost test suite.
//!
//! Provides site fixtures on disk and in-memory [`Document`] builders.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_site();
//! write_post(&site.path().join("blog_src"), "hello.md", "---\ntags: [rust]\n---\nHi");
//!
//! let docs = vec![doc("a", &["Go"]), doc("b", &[])];
//! ```

use crate::document::Document;
use crate::naming;
use chrono::{TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// The templates shipped in `templates/`.
pub const TEMPLATES: [(&str, &str); 3] = [
    (
        "blog_template.html",
        include_str!("../templates/blog_template.html"),
    ),
    (
        "blog_list_template.html",
        include_str!("../templates/blog_list_template.html"),
    ),
    (
        "tag_list_template.html",
        include_str!("../templates/tag_list_template.html"),
    ),
];

/// A temp site root with the stock templates and an empty `blog_src/`.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("blog_src")).unwrap();
    let templates = tmp.path().join("templates");
    fs::create_dir(&templates).unwrap();
    for (name, text) in TEMPLATES {
        fs::write(templates.join(name), text).unwrap();
    }
    tmp
}

/// Write a post file and return its path.
pub fn write_post(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

// =========================================================================
// In-memory documents
// =========================================================================

/// A document with fallback metadata, dated 2024-01-01.
pub fn doc(slug: &str, tags: &[&str]) -> Document {
    let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Document {
        title: naming::humanize(slug),
        body_html: String::new(),
        toc: String::new(),
        created_at: date,
        modified_at: date,
        author: "Anonymous".to_string(),
        description: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        slug: slug.to_string(),
        source_path: PathBuf::from(format!("blog_src/{slug}.md")),
    }
}
