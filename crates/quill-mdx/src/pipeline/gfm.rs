//! GitHub-flavored Markdown: tables, task lists, strikethrough, footnotes and
//! literal autolinks.

use std::sync::OnceLock;

use pulldown_cmark::{CowStr, Event, LinkType, Options, Tag, TagEnd};
use regex::Regex;

use super::{MarkdownTransform, TransformContext, TransformError};
use crate::events::MdEvent;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").expect("valid autolink regex")
    })
}

/// GFM extensions. The block-level ones come from the parser; bare URLs in
/// text are turned into links here.
#[derive(Debug, Default)]
pub struct Gfm;

impl Gfm {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownTransform for Gfm {
    fn name(&self) -> &'static str {
        "gfm"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
    }

    fn transform(
        &self,
        events: Vec<MdEvent>,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<Vec<MdEvent>, TransformError> {
        let mut out = Vec::with_capacity(events.len());
        // depth inside links, images and code blocks, where URLs stay text
        let mut opaque = 0usize;

        for event in events {
            match &event {
                MdEvent::Markdown(Event::Start(
                    Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_),
                )) => opaque += 1,
                MdEvent::Markdown(Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock)) => {
                    opaque = opaque.saturating_sub(1)
                }
                MdEvent::Markdown(Event::Text(text)) if opaque == 0 => {
                    if let Some(linked) = autolink(text) {
                        out.extend(linked);
                        continue;
                    }
                }
                _ => {}
            }
            out.push(event);
        }

        Ok(out)
    }
}

/// Split `text` around bare URLs, or `None` if it contains none.
fn autolink(text: &str) -> Option<Vec<MdEvent>> {
    let mut out = Vec::new();
    let mut last = 0;

    for m in url_regex().find_iter(text) {
        let url = trim_url(m.as_str());
        let prefix_len = if url.to_ascii_lowercase().starts_with("www.") {
            4
        } else {
            url.find("://").map(|i| i + 3).unwrap_or(0)
        };
        if url.len() <= prefix_len {
            continue;
        }

        if m.start() > last {
            out.push(text_event(&text[last..m.start()]));
        }

        let href = if prefix_len == 4 {
            format!("http://{}", url)
        } else {
            url.to_string()
        };

        out.push(MdEvent::Markdown(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        })));
        out.push(text_event(url));
        out.push(MdEvent::Markdown(Event::End(TagEnd::Link)));

        last = m.start() + url.len();
    }

    if out.is_empty() {
        return None;
    }
    if last < text.len() {
        out.push(text_event(&text[last..]));
    }
    Some(out)
}

/// Drop trailing punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let before = url.len();
        url = url.trim_end_matches(['.', ',', ':', ';', '!', '?', '"', '\'', '*', '_', '~']);
        if url.ends_with(')') && url.matches(')').count() > url.matches('(').count() {
            url = &url[..url.len() - 1];
        }
        if url.len() == before {
            return url;
        }
    }
}

fn text_event(text: &str) -> MdEvent {
    MdEvent::Markdown(Event::Text(CowStr::from(text.to_string())))
}
