//! CLI output formatting for the inspection commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every post is its title and position in the index (newest first),
//! with the source file and resolved metadata shown as secondary context on
//! indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 Release Notes (2 tags)
//!     Source: release_notes.md
//!     Date: 2024-03-01
//!     Tags: rust, web
//!     Description: What changed in this release...
//! 002 Hello World
//!     Source: hello_world.md
//!     Date: 2024-01-01
//!
//! Failures
//!     broken.md: front matter opened with `---` on line 1 is never closed
//!
//! Templates
//!     template not found: templates/tag_list_template.html
//!
//! Checked 3 posts: 2 ok, 1 failed
//! ```
//!
//! ## Build
//!
//! ```text
//! All posts → blogs/index.html
//! Release Notes → blog/release_notes/index.html
//! #rust → tag/rust/index.html
//!
//! API
//!     api/posts.json
//!     api/posts/release_notes.json
//!
//! Generated 2 pages, 1 tag pages, 2 API files
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::GenerateReport;
use crate::pipeline::CheckReport;
use crate::types::TagList;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Post header: position + title, with the tag count when there are tags.
///
/// ```text
/// 001 Release Notes (2 tags)
/// 002 Hello World
/// ```
fn post_header(index: usize, title: &str, tag_count: usize) -> String {
    match tag_count {
        0 => format!("{} {}", format_index(index), title),
        1 => format!("{} {} (1 tag)", format_index(index), title),
        n => format!("{} {} ({} tags)", format_index(index), title, n),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Path relative to `root` when it lives under it, else as given.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Check
// ============================================================================

/// Format the `check` report.
pub fn format_check_output(report: &CheckReport, source_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let docs = report.index.documents();
    let failures = report.index.failures();

    lines.push("Posts".to_string());
    if docs.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, doc) in docs.iter().enumerate() {
        lines.push(post_header(i + 1, &doc.title, doc.tags.len()));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            display_path(&doc.source_path, source_dir)
        ));
        lines.push(format!("{}Date: {}", indent(1), doc.created_at.format("%Y-%m-%d")));
        if !doc.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), doc.tags.join(", ")));
        }
        if !doc.description.is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(&doc.description, 60)
            ));
        }
    }

    if !failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for failure in failures {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                display_path(failure.path(), source_dir),
                failure.reason()
            ));
        }
    }

    if !report.template_errors.is_empty() {
        lines.push(String::new());
        lines.push("Templates".to_string());
        for error in &report.template_errors {
            lines.push(format!("{}{}", indent(1), error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Checked {} posts: {} ok, {} failed",
        docs.len() + failures.len(),
        docs.len(),
        failures.len()
    ));
    lines
}

pub fn print_check_output(report: &CheckReport, source_dir: &Path) {
    for line in format_check_output(report, source_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the `build` report. Paths are relative to the output directory.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut tag_pages = 0;

    for (label, path) in &report.pages {
        if label.starts_with('#') {
            tag_pages += 1;
        }
        lines.push(format!("{} \u{2192} {}", label, path.display()));
    }

    if !report.api.is_empty() {
        lines.push(String::new());
        lines.push("API".to_string());
        for path in &report.api {
            lines.push(format!("{}{}", indent(1), path.display()));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for failure in &report.failures {
            lines.push(format!("{}{}", indent(1), failure));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} pages, {} tag pages, {} API files",
        report.pages.len() - tag_pages,
        tag_pages,
        report.api.len()
    ));
    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tags
// ============================================================================

/// One line per tag, most used first.
///
/// ```text
/// rust (3)
/// Go (1)
/// ```
pub fn format_tag_index(tags: &TagList) -> Vec<String> {
    tags.tags
        .iter()
        .map(|t| format!("{} ({})", t.name, t.count))
        .collect()
}

pub fn print_tag_index(tags: &TagList) {
    for line in format_tag_index(tags) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
