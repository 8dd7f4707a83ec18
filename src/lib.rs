//! # inkpost
//!
//! Renders a directory of markdown posts with front matter into HTML pages,
//! tag views and a JSON API. The filesystem is the data source: every
//! `blog_src/<slug>.md` is a post, its filename stem is its URL, and its
//! front matter says who wrote it, when, and how it is tagged.
//!
//! # Architecture: One Pass Per Request
//!
//! Every operation rebuilds its view of the site from disk:
//!
//! ```text
//! blog_src/*.md ──► frontmatter ──► markup ──► metadata ──► Document
//!                                                              │
//!                    index (sort, filter, latest, tags) ◄──────┘
//!                                │
//!            compose (templates/*.html + cards) ──► HTML
//!            types ──► JSON
//! ```
//!
//! There is no cache of posts or rendered pages. A [`pipeline::Pipeline`]
//! holds only its configuration and the template cache, so any number of
//! threads can share one and each call sees the current files.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits `---` YAML / `+++` TOML front matter from the body |
//! | [`markup`] | Converter trait and the pulldown-cmark converter (heading anchors, outline, code blocks) |
//! | [`naming`] | Slug and fallback title from a filename; slug safety |
//! | [`metadata`] | Typed fields from front matter: title, author, description, date, tags |
//! | [`document`] | The resolved [`document::Document`] and its loader |
//! | [`index`] | Directory scan with failure isolation, ordering, tag filter, latest, tag counts |
//! | [`templates`] | Lazily loaded, cached page templates |
//! | [`compose`] | `{{placeholder}}` substitution and maud-rendered fragments |
//! | [`pipeline`] | The operations a front end calls: pages, post API, tags, check |
//! | [`generate`] | Static export of every page and API payload |
//! | [`types`] | JSON API payloads |
//! | [`config`] | `config.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Failure Isolation
//!
//! A broken post never breaks the listing. Load failures during a scan are
//! logged and reported by `inkpost check`, and the post is left out. Looking
//! a single post up is different: a missing slug is "not found" and any other
//! failure is reported as-is.
//!
//! ## Slugs Come From Filenames Only
//!
//! The slug is the filename stem, never front matter. Two files that differ
//! only by extension case share a slug; the first in name order keeps it and
//! the other is reported as a duplicate.
//!
//! ## Escaped Metadata
//!
//! Titles, authors, descriptions and tags are author-controlled text and are
//! HTML-escaped wherever they land in a page. Tags and slugs inside links are
//! percent-encoded. Only the converted body and its outline are inserted raw.
//!
//! ## Deliberately Small Templating
//!
//! Templates are plain HTML with `{{name}}` tokens filled in one pass. Values
//! are never re-scanned and unknown tokens are left alone. Anything richer
//! (cards, tag lists) is built in Rust with maud.

pub mod compose;
pub mod config;
pub mod document;
pub mod frontmatter;
pub mod generate;
pub mod index;
pub mod markup;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
