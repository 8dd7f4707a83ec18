//! Markdown body conversion.
//!
//! The pipeline only depends on [`MarkupConverter`]: body text in, HTML plus a
//! heading outline out. [`PulldownConverter`] is the bundled implementation on
//! top of [pulldown-cmark](https://docs.rs/pulldown-cmark), extended with the
//! pieces a blog post page needs:
//!
//! - **Heading anchors**: every heading gets a unique `id` and, optionally, a
//!   permalink anchor (`<a class="toc-link" href="#id">¶</a>`).
//! - **Table of contents**: a nested `<div class="toc"><ul>…</ul></div>`
//!   listing the headings, or an empty string when there are none.
//! - **Code blocks**: every code block is wrapped in `<div class="highlight">`.
//!   Fenced blocks in a language [syntect](https://docs.rs/syntect) knows are
//!   highlighted with inline styles from the configured theme, so the page
//!   needs no stylesheet for them. Other blocks keep pulldown-cmark's plain
//!   `<pre><code class="language-<lang>">` output.
//! - **Extensions**: tables, footnotes, strikethrough, task lists, definition
//!   lists, `{#id .class}` heading attributes, smart punctuation.

use crate::config::MarkdownConfig;
use maud::html;
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html as md_html,
};
use std::collections::HashSet;
use std::sync::LazyLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, start_highlighted_html_snippet, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use thiserror::Error;
use tracing::warn;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Whether `name` is one of the bundled highlighting themes.
pub fn has_theme(name: &str) -> bool {
    THEMES.themes.contains_key(name)
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("markup conversion failed: {0}")]
    Failed(String),
}

/// Output of a body conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Converted {
    pub html: String,
    /// HTML outline of the body's headings; empty when there are none.
    pub toc: String,
}

/// Converts a post body into HTML and a table of contents.
///
/// Implementations are shared across rayon workers while an index loads.
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, body: &str) -> Result<Converted, ConvertError>;
}

/// pulldown-cmark converter with heading anchors and a generated outline.
#[derive(Debug, Clone, Default)]
pub struct PulldownConverter {
    config: MarkdownConfig,
}

struct OutlineEntry {
    level: usize,
    id: String,
    text: String,
}

struct PendingCode<'a> {
    kind: CodeBlockKind<'a>,
    text: String,
}

struct PendingHeading<'a> {
    level: HeadingLevel,
    explicit_id: Option<String>,
    classes: Vec<String>,
    inner: Vec<Event<'a>>,
}

impl PulldownConverter {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_DEFINITION_LIST;
        if self.config.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }

    fn heading_html(&self, level: HeadingLevel, id: &str, classes: &[String], inner: &str) -> String {
        let tag = level.to_string();
        let mut out = format!("<{tag} id=\"{}\"", escape(id));
        if !classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape(&classes.join(" "))));
        }
        out.push('>');
        out.push_str(inner);
        if self.config.permalinks {
            out.push_str(&format!(
                "<a class=\"{}\" href=\"#{}\" title=\"{}\">{}</a>",
                escape(&self.config.permalink_class),
                escape(id),
                escape(&self.config.permalink_title),
                escape(&self.config.permalink_symbol),
            ));
        }
        out.push_str(&format!("</{tag}>\n"));
        out
    }

    /// Inline-styled HTML for a fenced block, or `None` when highlighting is
    /// off or the language is unknown.
    fn highlighted(&self, kind: &CodeBlockKind, code: &str) -> Option<String> {
        if !self.config.highlight {
            return None;
        }
        let CodeBlockKind::Fenced(info) = kind else {
            return None;
        };
        let lang = info
            .split(|c: char| c.is_whitespace() || c == ',')
            .next()
            .filter(|lang| !lang.is_empty())?;
        let syntax = SYNTAXES.find_syntax_by_token(lang)?;
        let theme = THEMES.themes.get(&self.config.highlight_theme)?;
        match highlight_block(code, lang, syntax, theme) {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(language = lang, error = %e, "highlighting failed, rendering plain code");
                None
            }
        }
    }

    fn push_code_block<'a>(&self, events: &mut Vec<Event<'a>>, block: PendingCode<'a>) {
        events.push(Event::Html(CowStr::from(format!(
            "<div class=\"{}\">\n",
            escape(&self.config.highlight_class)
        ))));
        match self.highlighted(&block.kind, &block.text) {
            Some(html) => events.push(Event::Html(CowStr::from(html))),
            None => {
                events.push(Event::Start(Tag::CodeBlock(block.kind)));
                events.push(Event::Text(CowStr::from(block.text)));
                events.push(Event::End(TagEnd::CodeBlock));
            }
        }
        events.push(Event::Html(CowStr::Borrowed("</div>\n")));
    }
}

fn highlight_block(
    code: &str,
    lang: &str,
    syntax: &SyntaxReference,
    theme: &Theme,
) -> Result<String, syntect::Error> {
    let (mut out, _) = start_highlighted_html_snippet(theme);
    out.push_str(&format!("<code class=\"language-{}\">", escape(lang)));
    let mut lines = HighlightLines::new(syntax, theme);
    for line in LinesWithEndings::from(code) {
        let regions = lines.highlight_line(line, &SYNTAXES)?;
        out.push_str(&styled_line_to_highlighted_html(&regions, IncludeBackground::No)?);
    }
    out.push_str("</code></pre>\n");
    Ok(out)
}

impl MarkupConverter for PulldownConverter {
    fn convert(&self, body: &str) -> Result<Converted, ConvertError> {
        let parser = Parser::new_ext(body, self.parser_options());

        let mut events: Vec<Event> = Vec::new();
        let mut outline = Vec::new();
        let mut ids = HeadingIds::default();
        let mut pending: Option<PendingHeading> = None;
        let mut code: Option<PendingCode> = None;

        for event in parser {
            if let Some(block) = code.as_mut() {
                match event {
                    Event::Text(text) => block.text.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(block) = code.take() {
                            self.push_code_block(&mut events, block);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            match event {
                Event::Start(Tag::Heading {
                    level, id, classes, ..
                }) => {
                    pending = Some(PendingHeading {
                        level,
                        explicit_id: id.map(|s| s.to_string()),
                        classes: classes.iter().map(|c| c.to_string()).collect(),
                        inner: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    let Some(heading) = pending.take() else {
                        continue;
                    };
                    let text = plain_text(&heading.inner);
                    let id = match heading.explicit_id.as_deref() {
                        Some(explicit) => ids.claim(explicit),
                        None => ids.claim(&slugify(&text)),
                    };
                    let mut inner = String::new();
                    md_html::push_html(&mut inner, heading.inner.into_iter());
                    let rendered = self.heading_html(heading.level, &id, &heading.classes, &inner);
                    events.push(Event::Html(CowStr::from(rendered)));
                    outline.push(OutlineEntry {
                        level: heading.level as usize,
                        id,
                        text,
                    });
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    code = Some(PendingCode {
                        kind,
                        text: String::new(),
                    });
                }
                other => match pending.as_mut() {
                    Some(heading) => heading.inner.push(other),
                    None => events.push(other),
                },
            }
        }

        let mut html = String::with_capacity(body.len() * 3 / 2);
        md_html::push_html(&mut html, events.into_iter());

        Ok(Converted {
            html,
            toc: render_outline(&outline),
        })
    }
}

/// Allocates unique heading ids: `intro`, `intro_1`, `intro_2`, ...
#[derive(Default)]
struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let mut candidate = base.to_string();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Heading text to anchor id: lowercase, word characters, spaces and dashes
/// kept, runs of spaces/dashes collapsed to one dash.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut pending_dash = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_whitespace() {
            pending_dash = true;
        } else {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }
    slug
}

fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// Render the heading outline as nested lists.
///
/// A deeper heading opens a list inside the previous item; a shallower one
/// closes lists until it finds its level. Skipped levels (h2 → h4) nest one
/// step, not two.
fn render_outline(entries: &[OutlineEntry]) -> String {
    let Some(first) = entries.first() else {
        return String::new();
    };

    let mut out = String::from("<div class=\"toc\">\n<ul>\n");
    let mut open: Vec<usize> = vec![first.level];

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            let top = open[open.len() - 1];
            if entry.level > top {
                out.push_str("\n<ul>\n");
                open.push(entry.level);
            } else {
                out.push_str("</li>\n");
                while open.len() > 1 && entry.level <= open[open.len() - 2] {
                    open.pop();
                    out.push_str("</ul>\n</li>\n");
                }
                if let Some(last) = open.last_mut() {
                    *last = entry.level.min(*last);
                }
            }
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape(&entry.id),
            escape(&entry.text)
        ));
    }

    out.push_str("</li>\n");
    while open.len() > 1 {
        open.pop();
        out.push_str("</ul>\n</li>\n");
    }
    out.push_str("</ul>\n</div>\n");
    out
}

/// HTML-escape text for element content or a quoted attribute.
pub(crate) fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}
