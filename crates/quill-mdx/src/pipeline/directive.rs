//! Container directives: `:::name[label]{attrs}` … `:::`.
//!
//! Fence lines are cut out of the Markdown at the line level by the parser
//! and arrive here as raw [`MdEvent::Fence`] lines. A closing fence only
//! closes a directive opened at the same block depth with a fence no longer
//! than it; any other fence line is kept as a paragraph of text.

use std::sync::OnceLock;

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::Regex;

use super::{MarkdownTransform, TransformContext, TransformError};
use crate::events::{Directive, MdEvent};

static OPEN_REGEX: OnceLock<Regex> = OnceLock::new();
static CLOSE_REGEX: OnceLock<Regex> = OnceLock::new();
static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();

fn open_regex() -> &'static Regex {
    OPEN_REGEX.get_or_init(|| {
        Regex::new(
            r"^(?P<fence>:{3,})(?P<name>[A-Za-z][\w-]*)\s*(?:\[(?P<label>.*?)\])?\s*(?:\{(?P<attrs>[^}]*)\})?\s*$",
        )
        .expect("valid directive regex")
    })
}

fn close_regex() -> &'static Regex {
    CLOSE_REGEX.get_or_init(|| Regex::new(r"^(?P<fence>:{3,})\s*$").expect("valid fence regex"))
}

fn attr_regex() -> &'static Regex {
    ATTR_REGEX.get_or_init(|| {
        Regex::new(
            r#"#(?P<id>[\w-]+)|\.(?P<class>[\w-]+)|(?P<key>[\w-]+)(?:=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"']+)))?"#,
        )
        .expect("valid attribute regex")
    })
}

/// Whether a line, leading indentation removed, opens or closes a container.
pub fn is_fence_line(line: &str) -> bool {
    let line = line.trim();
    close_regex().is_match(line) || open_regex().is_match(line)
}

/// Recognizes container directives.
#[derive(Debug, Default)]
pub struct Directives;

impl Directives {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct OpenFence {
    name: String,
    fence: usize,
    depth: usize,
}

enum Fence {
    Open(Directive, usize),
    Close(usize),
}

impl MarkdownTransform for Directives {
    fn name(&self) -> &'static str {
        "directive"
    }

    fn transform(
        &self,
        events: Vec<MdEvent>,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<Vec<MdEvent>, TransformError> {
        let mut out = Vec::with_capacity(events.len());
        let mut open: Vec<OpenFence> = Vec::new();
        let mut depth = 0usize;

        for event in events {
            match event {
                MdEvent::Fence(line) => match classify(&line) {
                    Some(Fence::Open(directive, fence)) => {
                        open.push(OpenFence {
                            name: directive.name.clone(),
                            fence,
                            depth,
                        });
                        out.push(MdEvent::DirectiveStart(directive));
                    }
                    Some(Fence::Close(fence))
                        if open
                            .last()
                            .is_some_and(|o| o.depth == depth && fence >= o.fence) =>
                    {
                        open.pop();
                        out.push(MdEvent::DirectiveEnd);
                    }
                    _ => out.extend(literal_paragraph(line)),
                },
                MdEvent::Markdown(Event::Start(_)) => {
                    depth += 1;
                    out.push(event);
                }
                MdEvent::Markdown(Event::End(_)) => {
                    if let Some(inner) = open.last().filter(|o| o.depth >= depth) {
                        return Err(TransformError::new(format!(
                            "directive `{}{}` is not closed before the end of its container",
                            ":".repeat(inner.fence),
                            inner.name
                        )));
                    }
                    depth = depth.saturating_sub(1);
                    out.push(event);
                }
                other => out.push(other),
            }
        }

        if let Some(unclosed) = open.pop() {
            return Err(TransformError::new(format!(
                "unclosed directive `{}{}`",
                ":".repeat(unclosed.fence),
                unclosed.name
            )));
        }

        Ok(out)
    }
}

/// A fence line that closes nothing stays visible as text.
fn literal_paragraph(line: String) -> [MdEvent; 3] {
    [
        MdEvent::Markdown(Event::Start(Tag::Paragraph)),
        MdEvent::Markdown(Event::Text(CowStr::from(line))),
        MdEvent::Markdown(Event::End(TagEnd::Paragraph)),
    ]
}

fn classify(line: &str) -> Option<Fence> {
    let line = line.trim();

    if let Some(caps) = close_regex().captures(line) {
        return Some(Fence::Close(caps["fence"].len()));
    }

    let caps = open_regex().captures(line)?;
    let directive = Directive {
        name: caps["name"].to_string(),
        label: caps
            .name("label")
            .map(|m| m.as_str().trim().to_string())
            .filter(|l| !l.is_empty()),
        attributes: caps
            .name("attrs")
            .map(|m| parse_attributes(m.as_str()))
            .unwrap_or_default(),
    };
    Some(Fence::Open(directive, caps["fence"].len()))
}

/// Parse `{#id .class key=value}` attribute syntax.
fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut classes: Vec<&str> = Vec::new();

    for caps in attr_regex().captures_iter(source) {
        if let Some(id) = caps.name("id") {
            attrs.push(("id".to_string(), id.as_str().to_string()));
        } else if let Some(class) = caps.name("class") {
            classes.push(class.as_str());
        } else if let Some(key) = caps.name("key") {
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))
                .map(|m| m.as_str())
                .unwrap_or("");
            attrs.push((key.as_str().to_string(), value.to_string()));
        }
    }

    if !classes.is_empty() {
        attrs.push(("class".to_string(), classes.join(" ")));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markdown;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Options;

    fn run(source: &str) -> Result<Vec<MdEvent>, TransformError> {
        let mut ctx = TransformContext::new("test");
        let options = Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
        Directives.transform(parse_markdown(source, options), &mut ctx)
    }

    fn starts(events: &[MdEvent]) -> Vec<Directive> {
        events
            .iter()
            .filter_map(|e| match e {
                MdEvent::DirectiveStart(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every directive is closed, and closed after all of `inner`.
    fn assert_encloses(events: &[MdEvent], inner: Tag<'static>) {
        let start = events
            .iter()
            .position(|e| matches!(e, MdEvent::DirectiveStart(_)))
            .unwrap();
        let end = events
            .iter()
            .position(|e| *e == MdEvent::DirectiveEnd)
            .unwrap();
        let block = events
            .iter()
            .position(|e| *e == MdEvent::Markdown(Event::Start(inner.clone())))
            .unwrap();
        let block_end = events
            .iter()
            .position(|e| *e == MdEvent::Markdown(Event::End(inner.to_end())))
            .unwrap();

        assert!(start < block && block_end < end);
        assert_eq!(end, events.len() - 1);
    }

    #[test]
    fn recognizes_directive_in_one_paragraph() {
        let events = run(":::warning[Careful]\nmind the step\n:::").unwrap();

        assert_eq!(
            events,
            vec![
                MdEvent::DirectiveStart(Directive {
                    name: "warning".to_string(),
                    label: Some("Careful".to_string()),
                    attributes: vec![],
                }),
                MdEvent::Markdown(Event::Start(Tag::Paragraph)),
                MdEvent::Markdown(Event::Text("mind the step".into())),
                MdEvent::Markdown(Event::End(TagEnd::Paragraph)),
                MdEvent::DirectiveEnd,
            ]
        );
    }

    #[test]
    fn closes_after_tight_list() {
        let events = run(":::tip\n- a\n- b\n:::").unwrap();

        assert_encloses(&events, Tag::List(None));
    }

    #[test]
    fn closes_after_ordered_list() {
        let events = run(":::note\n1. one\n2. two\n:::").unwrap();

        assert_encloses(&events, Tag::List(Some(1)));
    }

    #[test]
    fn closes_after_blockquote() {
        let events = run(":::note\n> quoted\n:::").unwrap();

        assert_encloses(&events, Tag::BlockQuote(None));
    }

    #[test]
    fn closes_after_table() {
        let events = run(":::note\n| a |\n|---|\n| 1 |\n:::").unwrap();

        let end = events
            .iter()
            .position(|e| *e == MdEvent::DirectiveEnd)
            .unwrap();
        let table_end = events
            .iter()
            .position(|e| *e == MdEvent::Markdown(Event::End(TagEnd::Table)))
            .unwrap();
        assert!(table_end < end);
        assert!(!events.iter().any(
            |e| matches!(e, MdEvent::Markdown(Event::Text(t)) if t.contains(":::"))
        ));
    }

    #[test]
    fn spans_multiple_blocks() {
        let events = run(":::note\nfirst\n\n- item\n\nlast\n:::\n\nafter").unwrap();

        assert_eq!(starts(&events).len(), 1);
        let end = events
            .iter()
            .position(|e| *e == MdEvent::DirectiveEnd)
            .unwrap();
        let after = events
            .iter()
            .position(|e| *e == MdEvent::Markdown(Event::Text("after".into())))
            .unwrap();
        assert!(end < after);
    }

    #[test]
    fn nests_with_longer_fences() {
        let events = run("::::note\nouter\n\n:::tip\ninner\n:::\n\n::::").unwrap();

        let names: Vec<_> = starts(&events).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["note", "tip"]);
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == MdEvent::DirectiveEnd)
                .count(),
            2
        );
    }

    #[test]
    fn keeps_label_source() {
        let events = run(":::warning[Use `cargo`]\nbody\n:::").unwrap();

        assert_eq!(starts(&events)[0].label.as_deref(), Some("Use `cargo`"));

        let events = run(":::note[See [docs](https://x.com)]\nbody\n:::").unwrap();

        assert_eq!(
            starts(&events)[0].label.as_deref(),
            Some("See [docs](https://x.com)")
        );
    }

    #[test]
    fn parses_attributes() {
        let events = run(":::details[More]{#extra .wide open title=\"A B\"}\nbody\n:::").unwrap();

        let directive = &starts(&events)[0];
        assert_eq!(directive.label.as_deref(), Some("More"));
        assert_eq!(
            directive.attributes,
            vec![
                ("id".to_string(), "extra".to_string()),
                ("open".to_string(), "".to_string()),
                ("title".to_string(), "A B".to_string()),
                ("class".to_string(), "wide".to_string()),
            ]
        );
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let source = "ratio 3:::1 is fine";
        let events = run(source).unwrap();

        assert!(starts(&events).is_empty());
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn keeps_stray_closing_fence_as_text() {
        let events = run("before\n\n:::").unwrap();

        assert!(starts(&events).is_empty());
        assert!(events.contains(&MdEvent::Markdown(Event::Text(":::".into()))));
    }

    #[test]
    fn ignores_fences_in_code_blocks() {
        let events = run("```md\n:::note\n```").unwrap();

        assert!(starts(&events).is_empty());
    }

    #[test]
    fn errors_on_unclosed_directive() {
        let err = run(":::tip\nno end").unwrap_err();

        assert!(err.to_string().contains(":::tip"));
    }

    #[test]
    fn errors_when_container_ends_first() {
        let err = run("- item\n\n  :::note\n  body\n\n- next\n\n:::").unwrap_err();

        assert!(err.to_string().contains("not closed before the end"));
    }
}
