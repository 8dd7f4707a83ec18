//! Static export.
//!
//! Writes every page and API payload the pipeline can serve into a directory,
//! laid out so a plain file server answers the same URLs:
//!
//! ```text
//! dist/
//! ├── blogs/index.html               # Listing page (routes.listing)
//! ├── blog/
//! │   └── hello_world/index.html     # Post pages (routes.post)
//! ├── tag/
//! │   └── rust/index.html            # Tag pages (routes.tag), one per spelling
//! └── api/
//!     ├── posts.json                 # {"posts": [...]}
//!     ├── latest.json                # newest `latest_limit` posts
//!     ├── tags.json                  # {"tags": [...]}
//!     └── posts/
//!         └── hello_world.json       # single post with body and toc
//! ```
//!
//! Unlike the per-request operations, an export renders everything from one
//! index snapshot. Post and tag directories are named with the raw slug or
//! tag, which is what a file server looks up after decoding the
//! percent-encoded link. Tags match case-insensitively but links keep each
//! post's spelling, so a tag page is written once per spelling in use.

use crate::compose;
use crate::document::{Document, LoadError};
use crate::index::{self, DocumentIndex};
use crate::markup::MarkupConverter;
use crate::naming;
use crate::pipeline::Pipeline;
use crate::templates::TemplateError;
use crate::types::{PostDetail, PostList, TagList};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// What an export wrote.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// `(label, path relative to the output directory)` for every HTML page.
    pub pages: Vec<(String, PathBuf)>,
    /// API payloads, relative to the output directory.
    pub api: Vec<PathBuf>,
    /// Posts left out of the export.
    pub failures: Vec<LoadError>,
}

/// Render the whole site into `output_dir`.
pub fn generate<C: MarkupConverter>(
    pipeline: &Pipeline<C>,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let config = pipeline.config();
    let templates = pipeline.templates();
    let document_template = templates.get(&config.templates.document)?;
    let listing_template = templates.get(&config.templates.listing)?;
    let tag_template = templates.get(&config.templates.tag)?;

    let snapshot = pipeline.index();
    let docs = snapshot.documents();
    let mut report = GenerateReport::default();

    fs::create_dir_all(output_dir)?;

    let listing = route_dir(&config.routes.listing).join("index.html");
    write_file(
        output_dir,
        &listing,
        &compose::listing_page(&listing_template, docs, config),
    )?;
    report.pages.push(("All posts".to_string(), listing));

    for doc in docs {
        if !naming::is_resolvable_slug(&doc.slug) {
            warn!(slug = %doc.slug, "slug cannot be used as a directory name, skipping its page");
            continue;
        }
        let page = route_dir(&config.routes.post)
            .join(&doc.slug)
            .join("index.html");
        write_file(
            output_dir,
            &page,
            &compose::document_page(&document_template, doc, config),
        )?;
        report.pages.push((doc.title.clone(), page));
    }

    for tag in index::tag_index(docs) {
        let tagged = index::filter_by_tag(docs, &tag.name);
        let html = compose::tag_page(&tag_template, &tag.name, &tagged, config);
        for spelling in spellings(&tagged, &tag.name) {
            if !naming::is_resolvable_slug(spelling) {
                warn!(tag = %spelling, "tag cannot be used as a directory name, skipping its page");
                continue;
            }
            let page = route_dir(&config.routes.tag)
                .join(spelling)
                .join("index.html");
            write_file(output_dir, &page, &html)?;
            report.pages.push((format!("#{spelling}"), page));
        }
    }

    write_api(output_dir, &snapshot, config.latest_limit, &mut report)?;

    let (_, failures) = snapshot.into_parts();
    if !failures.is_empty() {
        warn!(failures = failures.len(), "some posts were left out of the export");
    }
    report.failures = failures;
    Ok(report)
}

fn write_api(
    output_dir: &Path,
    snapshot: &DocumentIndex,
    latest_limit: usize,
    report: &mut GenerateReport,
) -> Result<(), GenerateError> {
    let docs = snapshot.documents();
    let api = PathBuf::from("api");

    let all: PostList = docs.iter().collect();
    report.api.push(write_json(output_dir, &api.join("posts.json"), &all)?);

    let limit = i64::try_from(latest_limit).unwrap_or(i64::MAX);
    let latest: PostList = index::latest(docs, limit).iter().collect();
    report.api.push(write_json(output_dir, &api.join("latest.json"), &latest)?);

    let tags = TagList::from(index::tag_index(docs));
    report.api.push(write_json(output_dir, &api.join("tags.json"), &tags)?);

    for doc in docs.iter().filter(|d| naming::is_resolvable_slug(&d.slug)) {
        let path = api.join("posts").join(format!("{}.json", doc.slug));
        report
            .api
            .push(write_json(output_dir, &path, &PostDetail::from(doc))?);
    }
    Ok(())
}

/// Every distinct way `tag` is written across `docs`, in index order.
fn spellings<'a>(docs: &[&'a Document], tag: &str) -> Vec<&'a str> {
    let wanted = tag.to_lowercase();
    let mut out: Vec<&str> = Vec::new();
    for doc in docs {
        for t in &doc.tags {
            if t.to_lowercase() == wanted && !out.contains(&t.as_str()) {
                out.push(t);
            }
        }
    }
    out
}

/// Output directory for a route prefix: `/blog` → `blog`, `/` → ``.
fn route_dir(prefix: &str) -> PathBuf {
    prefix
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn write_file(output_dir: &Path, relative: &Path, contents: &str) -> Result<(), GenerateError> {
    let path = output_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    debug!(path = %relative.display(), "wrote");
    Ok(())
}

fn write_json<T: Serialize>(
    output_dir: &Path,
    relative: &Path,
    value: &T,
) -> Result<PathBuf, GenerateError> {
    let json = serde_json::to_string_pretty(value)?;
    write_file(output_dir, relative, &json)?;
    Ok(relative.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup_site, write_post};
    use tempfile::TempDir;

    fn export(site: &Path) -> (TempDir, GenerateReport) {
        let out = TempDir::new().unwrap();
        let pipeline = Pipeline::open(site).unwrap();
        let report = generate(&pipeline, out.path()).unwrap();
        (out, report)
    }

    #[test]
    fn route_dir_strips_slashes() {
        assert_eq!(route_dir("/blog"), PathBuf::from("blog"));
        assert_eq!(route_dir("/a/b/"), PathBuf::from("a/b"));
        assert_eq!(route_dir("/"), PathBuf::new());
    }

    #[test]
    fn writes_pages_and_api() {
        let site = setup_site();
        let src = site.path().join("blog_src");
        write_post(&src, "first.md", "---\ntags: [Rust, C++]\ndate: 2024-01-01\n---\n# One");
        write_post(&src, "second.md", "---\ntags: [rust]\ndate: 2024-02-01\n---\nTwo");

        let (out, report) = export(site.path());
        let root = out.path();
        assert!(root.join("blogs/index.html").is_file());
        assert!(root.join("blog/first/index.html").is_file());
        assert!(root.join("blog/second/index.html").is_file());
        // Each spelling a post links to has a page.
        assert!(root.join("tag/rust/index.html").is_file());
        assert!(root.join("tag/Rust/index.html").is_file());
        // Raw name on disk: a server decodes /tag/C%2B%2B to tag/C++.
        assert!(root.join("tag/C++/index.html").is_file());
        assert!(!root.join("tag/C%2B%2B").exists());
        assert!(root.join("api/posts/first.json").is_file());

        let posts: PostList =
            serde_json::from_str(&fs::read_to_string(root.join("api/posts.json")).unwrap()).unwrap();
        let slugs: Vec<_> = posts.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second", "first"]);

        let tag_page = fs::read_to_string(root.join("tag/rust/index.html")).unwrap();
        assert_eq!(tag_page.matches("class=\"blog-card\"").count(), 2);

        assert_eq!(report.pages.len(), 6);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn tag_dirs_match_decoded_links() {
        let site = setup_site();
        let src = site.path().join("blog_src");
        write_post(&src, "a.md", "---\ntags: [Web Dev, café, a/b]\n---\n");

        let (out, _) = export(site.path());
        let root = out.path();
        let page = fs::read_to_string(root.join("blog/a/index.html")).unwrap();
        for (tag, dir) in [("Web Dev", "tag/Web Dev"), ("café", "tag/café")] {
            let href = compose::tag_href(&crate::config::RoutesConfig::default(), tag);
            assert!(page.contains(&format!("href=\"{href}\"")));
            let decoded = urlencoding::decode(&href).unwrap();
            assert_eq!(decoded.trim_start_matches('/'), dir);
            assert!(root.join(dir).join("index.html").is_file());
        }
        // A tag with a separator cannot be a directory.
        assert!(!root.join("tag/a").exists());
    }

    #[test]
    fn failures_are_reported_not_fatal() {
        let site = setup_site();
        let src = site.path().join("blog_src");
        write_post(&src, "good.md", "fine");
        write_post(&src, "bad.md", "---\nnever closed");

        let (out, report) = export(site.path());
        assert!(out.path().join("blog/good/index.html").is_file());
        assert!(!out.path().join("blog/bad").exists());
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn latest_json_uses_configured_limit() {
        let site = setup_site();
        fs::write(site.path().join("config.toml"), "latest_limit = 1").unwrap();
        let src = site.path().join("blog_src");
        write_post(&src, "a.md", "---\ndate: 2024-01-01\n---\n");
        write_post(&src, "b.md", "---\ndate: 2024-02-01\n---\n");

        let (out, _) = export(site.path());
        let latest: PostList =
            serde_json::from_str(&fs::read_to_string(out.path().join("api/latest.json")).unwrap())
                .unwrap();
        assert_eq!(latest.posts.len(), 1);
        assert_eq!(latest.posts[0].slug, "b");
    }

    #[test]
    fn missing_template_aborts_before_writing() {
        let site = setup_site();
        fs::remove_file(site.path().join("templates/blog_list_template.html")).unwrap();
        let out = TempDir::new().unwrap();
        let pipeline = Pipeline::open(site.path()).unwrap();
        let result = generate(&pipeline, &out.path().join("dist"));
        assert!(matches!(result, Err(GenerateError::Template(_))));
        assert!(!out.path().join("dist").exists());
    }
}
