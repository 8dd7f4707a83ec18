//! JSON API payloads.
//!
//! These are the shapes served by the post API and written to `api/*.json`
//! by `inkpost build`. Wire keys are camelCase (`createdAt`, `contentHtml`);
//! timestamps are ISO 8601 (RFC 3339) strings in UTC.

use crate::document::Document;
use crate::index::TagCount;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

fn iso8601(date: &chrono::DateTime<chrono::Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One entry of a post listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub author: String,
    pub created_at: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&Document> for PostSummary {
    fn from(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            author: doc.author.clone(),
            created_at: iso8601(&doc.created_at),
            description: doc.description.clone(),
            tags: doc.tags.clone(),
        }
    }
}

/// `{"posts": [...]}`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    pub posts: Vec<PostSummary>,
}

impl<'a> FromIterator<&'a Document> for PostList {
    fn from_iter<I: IntoIterator<Item = &'a Document>>(docs: I) -> Self {
        Self {
            posts: docs.into_iter().map(PostSummary::from).collect(),
        }
    }
}

/// A single post with its rendered body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub title: String,
    pub content_html: String,
    pub author: String,
    pub created_at: String,
    pub description: String,
    pub tags: Vec<String>,
    pub toc: String,
}

impl From<&Document> for PostDetail {
    fn from(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            content_html: doc.body_html.clone(),
            author: doc.author.clone(),
            created_at: iso8601(&doc.created_at),
            description: doc.description.clone(),
            tags: doc.tags.clone(),
            toc: doc.toc.clone(),
        }
    }
}

/// `{"tags": [{"name": ..., "count": ...}]}`, most used first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagList {
    pub tags: Vec<TagEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub count: usize,
}

impl From<Vec<TagCount>> for TagList {
    fn from(counts: Vec<TagCount>) -> Self {
        Self {
            tags: counts
                .into_iter()
                .map(|c| TagEntry {
                    name: c.name,
                    count: c.count,
                })
                .collect(),
        }
    }
}
