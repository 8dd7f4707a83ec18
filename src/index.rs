//! Post index: scan, order, and query the post directory.
//!
//! An index is a snapshot. It is rebuilt from the filesystem for every query
//! and nothing in it outlives the call that built it.
//!
//! ## Enumeration
//!
//! Only the top level of the post directory is read. Files are visited in
//! byte order of their names, and only those whose extension matches the
//! configured one (case-insensitively) are posts. Since `a.md` and `a.MD`
//! would share the slug `a`, the first file in that order owns the slug and
//! any later one is rejected as a duplicate. Files whose stem is not a
//! resolvable slug (dotfiles such as `.draft.md`) are skipped, so every
//! listed slug can be looked up again.
//!
//! ## Failure isolation
//!
//! One broken post never takes the listing down. A post that fails to load is
//! logged, recorded in [`DocumentIndex::failures`], and left out. A missing
//! post directory is an empty index.
//!
//! ## Ordering
//!
//! Newest `created_at` first. Ties keep enumeration order: loading runs on
//! rayon but collects in input order, and the sort is stable.

use crate::document::{Document, DocumentLoader, LoadError};
use crate::markup::MarkupConverter;
use crate::naming;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A post file found during enumeration, before it is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub slug: String,
    pub path: PathBuf,
}

/// Result of walking the post directory.
#[derive(Debug, Default)]
pub struct Enumeration {
    /// One entry per slug, in enumeration order.
    pub candidates: Vec<Candidate>,
    /// Files rejected because an earlier file owns their slug.
    pub duplicates: Vec<LoadError>,
}

/// List the post files in `dir`.
pub fn enumerate(dir: &Path, extension: &str) -> Enumeration {
    let mut enumeration = Enumeration::default();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "post directory missing");
        return enumeration;
    }

    let mut owners: HashMap<String, PathBuf> = HashMap::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !naming::has_extension(path, extension) {
            continue;
        }
        let Some(name) = naming::parse_post_name(path) else {
            continue;
        };
        // Hidden files and stems no lookup can resolve never become posts.
        if !naming::is_resolvable_slug(&name.slug) {
            debug!(path = %path.display(), "skipping unresolvable post name");
            continue;
        }
        match owners.get(&name.slug) {
            Some(owner) => enumeration.duplicates.push(LoadError::DuplicateSlug {
                slug: name.slug,
                path: path.to_path_buf(),
                owner: owner.clone(),
            }),
            None => {
                owners.insert(name.slug.clone(), path.to_path_buf());
                enumeration.candidates.push(Candidate {
                    slug: name.slug,
                    path: path.to_path_buf(),
                });
            }
        }
    }
    enumeration
}

/// Find the file that owns `slug`, using the same rules as a full scan.
///
/// Slugs that could name anything outside the post directory resolve to
/// nothing.
pub fn locate(dir: &Path, extension: &str, slug: &str) -> Option<PathBuf> {
    if !naming::is_resolvable_slug(slug) {
        return None;
    }
    enumerate(dir, extension)
        .candidates
        .into_iter()
        .find(|c| c.slug == slug)
        .map(|c| c.path)
}

/// Ordered snapshot of every loadable post.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    documents: Vec<Document>,
    failures: Vec<LoadError>,
}

impl DocumentIndex {
    /// Scan `dir` and load every post in it.
    pub fn load<C: MarkupConverter + ?Sized>(
        dir: &Path,
        extension: &str,
        loader: &DocumentLoader<'_, C>,
    ) -> Self {
        let Enumeration {
            candidates,
            duplicates,
        } = enumerate(dir, extension);

        let results: Vec<Result<Document, LoadError>> = candidates
            .par_iter()
            .map(|candidate| loader.load(&candidate.path))
            .collect();

        let mut documents = Vec::with_capacity(results.len());
        let mut failures = duplicates;
        for result in results {
            match result {
                Ok(doc) => documents.push(doc),
                Err(e) => failures.push(e),
            }
        }
        for failure in &failures {
            warn!(path = %failure.path().display(), error = %failure, "skipping post");
        }

        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        info!(
            dir = %dir.display(),
            loaded = documents.len(),
            failed = failures.len(),
            "indexed posts"
        );
        Self {
            documents,
            failures,
        }
    }

    /// Posts, newest first.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Posts that were excluded, with the reason.
    pub fn failures(&self) -> &[LoadError] {
        &self.failures
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    /// `(documents, failures)`.
    pub fn into_parts(self) -> (Vec<Document>, Vec<LoadError>) {
        (self.documents, self.failures)
    }
}

/// Posts carrying `tag`, compared case-insensitively. Input order is kept.
pub fn filter_by_tag<'a>(docs: &'a [Document], tag: &str) -> Vec<&'a Document> {
    docs.iter().filter(|d| d.has_tag(tag)).collect()
}

/// The first `limit` posts. Zero or negative limits yield nothing.
pub fn latest(docs: &[Document], limit: i64) -> &[Document] {
    let take = usize::try_from(limit).unwrap_or(0).min(docs.len());
    &docs[..take]
}

/// A distinct tag and the number of posts carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCount {
    /// Casing of the first post (in index order) that used the tag.
    pub name: String,
    pub count: usize,
}

/// Every distinct tag, most used first, then alphabetically.
pub fn tag_index(docs: &[Document]) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        let mut seen_in_doc: Vec<String> = Vec::new();
        for tag in &doc.tags {
            let key = tag.to_lowercase();
            if seen_in_doc.contains(&key) {
                continue;
            }
            match positions.get(&key) {
                Some(&i) => counts[i].count += 1,
                None => {
                    positions.insert(key.clone(), counts.len());
                    counts.push(TagCount {
                        name: tag.clone(),
                        count: 1,
                    });
                }
            }
            seen_in_doc.push(key);
        }
    }
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    counts
}
