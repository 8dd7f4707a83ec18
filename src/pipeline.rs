//! The post pipeline: every operation a front end needs.
//!
//! A [`Pipeline`] holds only immutable settings (site root, configuration,
//! converter) plus the template cache. Each call builds its own index
//! snapshot from the post directory, so concurrent calls share nothing
//! mutable and always see the filesystem as it is now.
//!
//! | Operation | Result |
//! |-----------|--------|
//! | [`Pipeline::render_document_page`] | post page HTML, or not found |
//! | [`Pipeline::render_listing_page`] | all-posts page HTML |
//! | [`Pipeline::render_tag_page`] | tag page HTML (a "no posts" page when nothing matches) |
//! | [`Pipeline::list_posts`] | every post summary |
//! | [`Pipeline::latest_posts`] | the newest `limit` summaries |
//! | [`Pipeline::get_post`] | one post with body and outline, or not found |
//! | [`Pipeline::tags`] | tag counts |
//! | [`Pipeline::check`] | the index plus template problems |

use crate::compose;
use crate::config::{self, ConfigError, SiteConfig};
use crate::document::{Document, DocumentLoader, LoadError};
use crate::index::{self, DocumentIndex};
use crate::markup::{MarkupConverter, PulldownConverter};
use crate::templates::{TemplateError, TemplateStore};
use crate::types::{PostDetail, PostList, TagList};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no post named '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Load(LoadError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl PipelineError {
    /// Whether this is the user-visible "not found" outcome. Everything else
    /// is a processing failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::NotFound(_))
    }
}

/// Result of [`Pipeline::check`].
#[derive(Debug)]
pub struct CheckReport {
    pub index: DocumentIndex,
    /// Configured templates that cannot be loaded.
    pub template_errors: Vec<TemplateError>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.index.failures().is_empty() && self.template_errors.is_empty()
    }
}

pub struct Pipeline<C: MarkupConverter = PulldownConverter> {
    root: PathBuf,
    config: SiteConfig,
    converter: C,
    templates: TemplateStore,
}

impl Pipeline<PulldownConverter> {
    /// Pipeline for the site at `root`, converting with pulldown-cmark.
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        let converter = PulldownConverter::new(config.markdown.clone());
        Self::with_converter(root, config, converter)
    }

    /// Load `config.toml` from `root` and build a pipeline from it.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = config::load_config(&root)?;
        Ok(Self::new(root, config))
    }
}

impl<C: MarkupConverter> Pipeline<C> {
    pub fn with_converter(root: impl Into<PathBuf>, config: SiteConfig, converter: C) -> Self {
        let root = root.into();
        let templates = TemplateStore::new(config.templates_path(&root));
        Self {
            root,
            config,
            converter,
            templates,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn source_dir(&self) -> PathBuf {
        self.config.source_path(&self.root)
    }

    fn loader(&self) -> DocumentLoader<'_, C> {
        DocumentLoader::new(&self.converter, &self.config.default_author)
    }

    /// Fresh snapshot of every loadable post, newest first.
    pub fn index(&self) -> DocumentIndex {
        DocumentIndex::load(&self.source_dir(), &self.config.extension, &self.loader())
    }

    /// Load the post that owns `slug`.
    pub fn document(&self, slug: &str) -> Result<Document, PipelineError> {
        let path = index::locate(&self.source_dir(), &self.config.extension, slug)
            .ok_or_else(|| PipelineError::NotFound(slug.to_string()))?;
        self.loader().load(&path).map_err(|e| match e {
            LoadError::NotFound(_) => PipelineError::NotFound(slug.to_string()),
            other => PipelineError::Load(other),
        })
    }

    pub fn render_document_page(&self, slug: &str) -> Result<String, PipelineError> {
        let doc = self.document(slug)?;
        let template = self.templates.get(&self.config.templates.document)?;
        Ok(compose::document_page(&template, &doc, &self.config))
    }

    pub fn render_listing_page(&self) -> Result<String, PipelineError> {
        let template = self.templates.get(&self.config.templates.listing)?;
        let snapshot = self.index();
        Ok(compose::listing_page(&template, snapshot.documents(), &self.config))
    }

    pub fn render_tag_page(&self, tag: &str) -> Result<String, PipelineError> {
        let template = self.templates.get(&self.config.templates.tag)?;
        let snapshot = self.index();
        let tagged = index::filter_by_tag(snapshot.documents(), tag);
        Ok(compose::tag_page(&template, tag, &tagged, &self.config))
    }

    pub fn list_posts(&self) -> PostList {
        self.index().documents().iter().collect()
    }

    /// The newest `limit` posts. Zero or negative limits yield an empty list.
    pub fn latest_posts(&self, limit: i64) -> PostList {
        let snapshot = self.index();
        index::latest(snapshot.documents(), limit).iter().collect()
    }

    pub fn get_post(&self, slug: &str) -> Result<PostDetail, PipelineError> {
        self.document(slug).map(|doc| PostDetail::from(&doc))
    }

    pub fn tags(&self) -> TagList {
        TagList::from(index::tag_index(self.index().documents()))
    }

    /// Load everything and report what would fail.
    pub fn check(&self) -> CheckReport {
        let names = &self.config.templates;
        let template_errors = [&names.document, &names.listing, &names.tag]
            .into_iter()
            .filter_map(|name| self.templates.get(name).err())
            .collect();
        CheckReport {
            index: self.index(),
            template_errors,
        }
    }
}
