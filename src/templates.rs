//! Page templates.
//!
//! Templates are plain HTML files in the template directory, read the first
//! time they are asked for and kept for the life of the store. Edits to a
//! template are picked up by the next process, never by a running one.
//! There is no built-in fallback: a missing template fails the page.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(PathBuf),
    #[error("reading template {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Lazily-loading, caching template lookup.
///
/// Shared by every thread serving pages: lookups after the first take only
/// the read lock.
#[derive(Debug)]
pub struct TemplateStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template text for `name`, a file name inside the template directory.
    pub fn get(&self, name: &str) -> Result<Arc<str>, TemplateError> {
        if let Some(hit) = self.cache.read().get(name).cloned() {
            return Ok(hit);
        }

        let path = self.dir.join(name);
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(TemplateError::NotFound(path));
        }
        let text: Arc<str> = match fs::read_to_string(&path) {
            Ok(text) => text.into(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(path));
            }
            Err(source) => return Err(TemplateError::Io { path, source }),
        };
        debug!(template = name, "loaded template");

        // Two threads may race to load the same file; the first insert wins so
        // every caller sees one text.
        let cached = self
            .cache
            .write()
            .entry(name.to_string())
            .or_insert(text)
            .clone();
        Ok(cached)
    }
}
