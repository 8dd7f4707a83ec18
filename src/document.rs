//! Post loading.
//!
//! A [`Document`] is one post, fully resolved: front matter split off and
//! typed, body converted, and every missing field filled from the filesystem
//! or a default. Front matter always wins; derived values are fallbacks only.
//!
//! ```text
//! blog_src/hello_world.md
//!   ├── read         raw text + file timestamps
//!   ├── frontmatter  mapping + body
//!   ├── markup       body html + toc
//!   └── metadata     title, author, description, tags, created
//! ```

use crate::frontmatter::{self, FrontmatterError};
use crate::markup::{ConvertError, MarkupConverter};
use crate::metadata;
use crate::naming;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("post not found: {0}")]
    NotFound(PathBuf),
    #[error("reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("front matter in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: FrontmatterError,
    },
    #[error("converting {path}: {source}")]
    Conversion { path: PathBuf, source: ConvertError },
    #[error("slug '{slug}' of {path} is already taken by {owner}")]
    DuplicateSlug {
        slug: String,
        path: PathBuf,
        owner: PathBuf,
    },
}

impl LoadError {
    /// Source file the failure belongs to.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound(path) => path,
            LoadError::Io { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Conversion { path, .. }
            | LoadError::DuplicateSlug { path, .. } => path,
        }
    }

    /// The failure without the path, for listings that already show it.
    pub fn reason(&self) -> String {
        match self {
            LoadError::NotFound(_) => "file not found".to_string(),
            LoadError::Io { source, .. } => source.to_string(),
            LoadError::Parse { source, .. } => source.to_string(),
            LoadError::Conversion { source, .. } => source.to_string(),
            LoadError::DuplicateSlug { slug, owner, .. } => {
                let owner = owner.file_name().unwrap_or(owner.as_os_str());
                format!("slug '{slug}' is already taken by {}", owner.to_string_lossy())
            }
        }
    }
}

/// A fully-resolved post. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Front matter `title`, else the humanized filename stem.
    pub title: String,
    pub body_html: String,
    /// Heading outline HTML; empty when the body has no headings.
    pub toc: String,
    /// Front matter `date`, else filesystem creation time.
    pub created_at: DateTime<Utc>,
    /// Filesystem modification time. Front matter never overrides it.
    pub modified_at: DateTime<Utc>,
    pub author: String,
    pub description: String,
    /// Authored order and casing.
    pub tags: Vec<String>,
    /// Filename stem; the public identifier.
    pub slug: String,
    pub source_path: PathBuf,
}

impl Document {
    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }
}

/// Builds [`Document`]s from post files.
pub struct DocumentLoader<'a, C: MarkupConverter + ?Sized> {
    converter: &'a C,
    default_author: &'a str,
}

impl<'a, C: MarkupConverter + ?Sized> DocumentLoader<'a, C> {
    pub fn new(converter: &'a C, default_author: &'a str) -> Self {
        Self {
            converter,
            default_author,
        }
    }

    /// Load and resolve one post file.
    pub fn load(&self, path: &Path) -> Result<Document, LoadError> {
        let parsed_name =
            naming::parse_post_name(path).ok_or_else(|| LoadError::NotFound(path.to_path_buf()))?;

        let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let (modified_at, fs_created_at) = file_times(path)?;

        let (meta, body) = frontmatter::parse(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let converted = self
            .converter
            .convert(&body)
            .map_err(|source| LoadError::Conversion {
                path: path.to_path_buf(),
                source,
            })?;

        let title_meta = metadata::scalar(&meta, "title");
        let author_meta = metadata::scalar(&meta, "author");
        let description_meta = metadata::scalar(&meta, "description");

        let title = metadata::resolve(&[title_meta.as_deref(), Some(&parsed_name.display_title)])
            .unwrap_or_else(|| parsed_name.slug.clone());
        let author = metadata::resolve(&[author_meta.as_deref(), Some(self.default_author)])
            .unwrap_or_default();
        let description = metadata::resolve(&[description_meta.as_deref()]).unwrap_or_default();

        debug!(slug = %parsed_name.slug, path = %path.display(), "loaded post");

        Ok(Document {
            title,
            body_html: converted.html,
            toc: converted.toc,
            created_at: metadata::created_at(&meta, fs_created_at, &parsed_name.slug),
            modified_at,
            author,
            description,
            tags: metadata::tags(&meta),
            slug: parsed_name.slug,
            source_path: path.to_path_buf(),
        })
    }
}

fn io_error(path: &Path, err: io::Error) -> LoadError {
    if err.kind() == io::ErrorKind::NotFound {
        LoadError::NotFound(path.to_path_buf())
    } else {
        LoadError::Io {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

/// `(modified, created)`. Creation time falls back to modification time on
/// platforms and filesystems that do not record it.
fn file_times(path: &Path) -> Result<(DateTime<Utc>, DateTime<Utc>), LoadError> {
    let meta = fs::metadata(path).map_err(|e| io_error(path, e))?;
    let modified = meta.modified().map_err(|e| io_error(path, e))?;
    let created = meta.created().unwrap_or(modified);
    Ok((DateTime::from(modified), DateTime::from(created)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{Converted, PulldownConverter};
    use crate::test_helpers::write_post;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn load(path: &Path) -> Result<Document, LoadError> {
        let converter = PulldownConverter::default();
        DocumentLoader::new(&converter, "Anonymous").load(path)
    }

    #[test]
    fn explicit_fields_win() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(
            tmp.path(),
            "first_post.md",
            "---\ntitle: A Better Title\nauthor: Sam\ndescription: Short\ntags: [Go, web]\ndate: 2024-03-01\n---\n# Hi\n",
        );
        let doc = load(&path).unwrap();
        assert_eq!(doc.title, "A Better Title");
        assert_eq!(doc.author, "Sam");
        assert_eq!(doc.description, "Short");
        assert_eq!(doc.tags, vec!["Go", "web"]);
        assert_eq!(doc.created_at, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(doc.slug, "first_post");
    }

    #[test]
    fn bare_post_uses_fallbacks() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "my_first_post.md", "Just text.");
        let doc = load(&path).unwrap();
        assert_eq!(doc.title, "My First Post");
        assert_eq!(doc.author, "Anonymous");
        assert_eq!(doc.description, "");
        assert!(doc.tags.is_empty());
        assert_eq!(doc.toc, "");
        assert!(doc.body_html.contains("<p>Just text.</p>"));
    }

    #[test]
    fn created_falls_back_to_file_time() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "undated.md", "body");
        let doc = load(&path).unwrap();
        // Birth time is never later than the last write.
        assert!(doc.created_at <= doc.modified_at);
    }

    #[test]
    fn date_never_overrides_modified() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "old.md", "---\ndate: 1999-01-01\n---\nbody");
        let doc = load(&path).unwrap();
        assert!(doc.modified_at > doc.created_at);
    }

    #[test]
    fn padded_values_are_kept_as_written() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(
            tmp.path(),
            "p.md",
            "---\ntitle: \"  Spaced  \"\nauthor: \" Sam \"\ntags: [\" Go \"]\n---\nbody",
        );
        let doc = load(&path).unwrap();
        assert_eq!(doc.title, "  Spaced  ");
        assert_eq!(doc.author, " Sam ");
        assert_eq!(doc.tags, vec![" Go "]);
    }

    #[test]
    fn blank_author_uses_default() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "p.md", "---\nauthor: \"  \"\n---\nbody");
        assert_eq!(load(&path).unwrap().author, "Anonymous");
    }

    #[test]
    fn configured_default_author() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "p.md", "body");
        let converter = PulldownConverter::default();
        let doc = DocumentLoader::new(&converter, "The Team").load(&path).unwrap();
        assert_eq!(doc.author, "The Team");
    }

    #[test]
    fn toc_present_when_headings_exist() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "p.md", "# One\n\n## Two\n");
        let doc = load(&path).unwrap();
        assert!(doc.toc.contains("href=\"#one\""));
        assert!(doc.toc.contains("href=\"#two\""));
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = load(&tmp.path().join("nope.md"));
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn malformed_front_matter_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "bad.md", "---\ntitle: oops\n\nno closing fence");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    struct FailingConverter;

    impl MarkupConverter for FailingConverter {
        fn convert(&self, _body: &str) -> Result<Converted, ConvertError> {
            Err(ConvertError::Failed("boom".into()))
        }
    }

    #[test]
    fn converter_failure_is_conversion_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "p.md", "body");
        let result = DocumentLoader::new(&FailingConverter, "Anonymous").load(&path);
        assert!(matches!(result, Err(LoadError::Conversion { .. })));
    }

    #[test]
    fn reason_omits_path() {
        let err = LoadError::DuplicateSlug {
            slug: "a".into(),
            path: PathBuf::from("/site/blog_src/a.md"),
            owner: PathBuf::from("/site/blog_src/a.MD"),
        };
        assert_eq!(err.reason(), "slug 'a' is already taken by a.MD");
        assert_eq!(err.path(), Path::new("/site/blog_src/a.md"));
    }

    #[test]
    fn has_tag_ignores_case() {
        let tmp = TempDir::new().unwrap();
        let path = write_post(tmp.path(), "p.md", "---\ntags: [Go]\n---\n");
        let doc = load(&path).unwrap();
        assert!(doc.has_tag("go"));
        assert!(doc.has_tag("GO"));
        assert!(!doc.has_tag("rust"));
    }
}
