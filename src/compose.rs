//! Page composition.
//!
//! Templates are ordinary HTML with `{{name}}` placeholders. [`compose`] fills
//! them in a single left-to-right pass:
//!
//! - a placeholder with a value in [`Fields`] is replaced by that value;
//! - a placeholder without one is left in the output as written;
//! - substituted values are never scanned again, so a post whose title is
//!   `{{content}}` shows exactly that text.
//!
//! Everything else here builds the values: post cards, tag links, the table
//! of contents wrapper and the tag page's count line, all rendered with maud.
//! Every string that came out of front matter is HTML-escaped on the way in.
//! Converted body HTML and the heading outline are inserted as-is.
//!
//! ## Placeholders
//!
//! | Page | Placeholders |
//! |------|--------------|
//! | post | `title` `author` `created_date` `modified_date` `description` `content` `toc` `tags` `slug` |
//! | listing | `title` `header` `blog_cards` |
//! | tag | `title` `header` `description` `blog_cards` `section_footer` |
//!
//! Every page also gets `listing_url`, the configured all-posts route, for
//! navigation links.

use crate::config::{RoutesConfig, SiteConfig};
use crate::document::Document;
use crate::markup::escape;
use chrono::{DateTime, Utc};
use maud::{Markup, PreEscaped, html};
use std::collections::HashMap;
use std::fmt::Write;

/// Placeholder values for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a placeholder to a value that is already safe HTML.
    pub fn set(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Set a placeholder to plain text, escaping it.
    pub fn text(self, name: &str, value: &str) -> Self {
        self.set(name, escape(value))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Fields {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .fold(Fields::new(), |fields, (name, value)| fields.set(name, value))
    }
}

/// Fill `{{name}}` placeholders in `template` from `fields`.
pub fn compose(template: &str, fields: &Fields) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let value = after_open.find("}}").and_then(|end| {
            let name = &after_open[..end];
            is_placeholder_name(name)
                .then(|| fields.get(name))
                .flatten()
                .map(|value| (value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after_open[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// URLs and dates
// ============================================================================

/// Link to a post page. The slug is one percent-encoded path segment.
pub fn post_href(routes: &RoutesConfig, slug: &str) -> String {
    format!("{}/{}", routes.post, urlencoding::encode(slug))
}

/// Link to a tag page. The tag is one percent-encoded path segment.
pub fn tag_href(routes: &RoutesConfig, tag: &str) -> String {
    format!("{}/{}", routes.tag, urlencoding::encode(tag))
}

/// Format a timestamp for display. A format chrono cannot render falls back
/// to `YYYY-MM-DD`.
pub fn format_date(date: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

// ============================================================================
// Fragments
// ============================================================================

/// Tag links for a post, or nothing when it has no tags.
pub fn tag_links(tags: &[String], routes: &RoutesConfig) -> Markup {
    html! {
        @if !tags.is_empty() {
            div.post-tags {
                @for tag in tags {
                    a.tag href=(tag_href(routes, tag)) { (tag) }
                }
            }
        }
    }
}

/// Table of contents wrapper, or nothing when the outline is empty.
pub fn toc_block(toc: &str) -> Markup {
    html! {
        @if !toc.trim().is_empty() {
            div.table-of-contents {
                h3 { "Table of Contents" }
                (PreEscaped(toc))
            }
        }
    }
}

/// Summary card for listing and tag pages.
pub fn card(doc: &Document, config: &SiteConfig) -> Markup {
    let description = if doc.description.is_empty() {
        config.cards.missing_description.as_str()
    } else {
        doc.description.as_str()
    };
    html! {
        div.blog-card {
            h2 {
                a href=(post_href(&config.routes, &doc.slug)) { (doc.title) }
            }
            div.post-meta {
                span { "By " (doc.author) }
                span { (format_date(&doc.created_at, &config.date_format)) }
            }
            p.post-description { (description) }
            (tag_links(&doc.tags, &config.routes))
        }
    }
}

/// Cards for every post, in order.
pub fn cards<'a>(docs: impl IntoIterator<Item = &'a Document>, config: &SiteConfig) -> Markup {
    html! {
        @for doc in docs {
            (card(doc, config))
        }
    }
}

/// Shown on a tag page when no post carries the tag.
pub fn no_posts(tag: &str, routes: &RoutesConfig) -> Markup {
    html! {
        div.no-posts {
            h2 { "No posts found with tag \"" (tag) "\"" }
            p {
                a href=(routes.listing) { "View all posts" }
                " or "
                a href="/" { "return to homepage" }
            }
        }
    }
}

/// "Showing N post(s) with this tag".
pub fn count_description(count: usize) -> String {
    match count {
        1 => "Showing 1 post with this tag".to_string(),
        n => format!("Showing {n} posts with this tag"),
    }
}

/// Footer link back to the full listing.
pub fn view_all_footer(routes: &RoutesConfig) -> Markup {
    html! {
        a.btn.btn-outline href=(routes.listing) { "View All Posts" }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Fields for a single post page.
pub fn document_fields(doc: &Document, config: &SiteConfig) -> Fields {
    Fields::new()
        .text("listing_url", &config.routes.listing)
        .text("title", &doc.title)
        .text("author", &doc.author)
        .text("created_date", &format_date(&doc.created_at, &config.date_format))
        .text("modified_date", &format_date(&doc.modified_at, &config.date_format))
        .text("description", &doc.description)
        .text("slug", &doc.slug)
        .set("content", doc.body_html.as_str())
        .set("toc", toc_block(&doc.toc).into_string())
        .set("tags", tag_links(&doc.tags, &config.routes).into_string())
}

pub fn document_page(template: &str, doc: &Document, config: &SiteConfig) -> String {
    compose(template, &document_fields(doc, config))
}

/// Page listing every post.
pub fn listing_page<'a>(
    template: &str,
    docs: impl IntoIterator<Item = &'a Document>,
    config: &SiteConfig,
) -> String {
    let fields = Fields::new()
        .text("listing_url", &config.routes.listing)
        .text("title", "All Posts")
        .text("header", "All Blog Posts")
        .set("blog_cards", cards(docs, config).into_string());
    compose(template, &fields)
}

/// Page listing the posts carrying `tag`. `docs` is already filtered.
pub fn tag_page(template: &str, tag: &str, docs: &[&Document], config: &SiteConfig) -> String {
    let heading = format!("Posts tagged \"{tag}\"");
    let (description, body) = if docs.is_empty() {
        (String::new(), no_posts(tag, &config.routes))
    } else {
        (
            count_description(docs.len()),
            cards(docs.iter().copied(), config),
        )
    };
    let fields = Fields::new()
        .text("listing_url", &config.routes.listing)
        .text("title", &heading)
        .text("header", &heading)
        .text("description", &description)
        .set("blog_cards", body.into_string())
        .set("section_footer", view_all_footer(&config.routes).into_string());
    compose(template, &fields)
}
