//! Lowering of the Markdown-layer tree into the HTML tree.
//!
//! Containers are built on a frame stack. Each frame remembers which kind of
//! event opened it so that a closer of another kind is reported instead of
//! silently closing the wrong container.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Options, Tag};

use super::math::{MATH_DISPLAY, MATH_INLINE};
use super::TransformError;
use crate::binding::{ComponentBinding, LABEL_HTML};
use crate::codeblock::FenceInfo;
use crate::events::{Admonition, Directive, Math, MdEvent};
use crate::hast::{text_content, ComponentNode, Element, Node, Root};
use crate::parser::parse_markdown;
use crate::render::render;
use crate::slug::slugify;

/// Lower a Markdown-layer event list into an HTML tree.
pub fn lower(events: Vec<MdEvent>) -> Result<Root, TransformError> {
    let mut lowerer = Lowerer::new();
    for event in events {
        lowerer.push(event)?;
    }
    lowerer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Root,
    Markdown,
    Directive,
    Admonition,
}

impl Opener {
    fn describe(self) -> &'static str {
        match self {
            Opener::Root => "document",
            Opener::Markdown => "markdown container",
            Opener::Directive => "directive",
            Opener::Admonition => "admonition",
        }
    }
}

#[derive(Debug)]
enum FrameKind {
    Element(Element),
    Component(ComponentNode),
    CodeBlock { info: FenceInfo, text: String },
    Image(Element),
    TableHead,
    FootnoteDefinition(String),
    /// Children are spliced into the parent
    Transparent,
    /// Children are dropped
    Skip,
}

#[derive(Debug)]
struct Frame {
    opener: Opener,
    kind: FrameKind,
    children: Vec<Node>,
}

#[derive(Debug, Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

/// Footnote labels in order of first reference, plus collected definitions.
#[derive(Debug, Default)]
struct Footnotes {
    referenced: Vec<String>,
    definitions: Vec<(String, Vec<Node>)>,
}

impl Footnotes {
    fn reference(&mut self, label: &str) -> usize {
        match self.referenced.iter().position(|l| l == label) {
            Some(i) => i + 1,
            None => {
                self.referenced.push(label.to_string());
                self.referenced.len()
            }
        }
    }

    /// The `<section>` listing every definition, referenced ones first.
    fn into_section(mut self) -> Option<Node> {
        if self.definitions.is_empty() {
            return None;
        }

        let mut ordered = Vec::with_capacity(self.definitions.len());
        for label in &self.referenced {
            if let Some(i) = self.definitions.iter().position(|(l, _)| l == label) {
                ordered.push(self.definitions.remove(i));
            }
        }
        ordered.append(&mut self.definitions);

        let items = ordered
            .into_iter()
            .map(|(label, mut children)| {
                let id = footnote_id(&label);
                children.push(
                    Element::new("a")
                        .with_attr("href", format!("#fnref-{}", id))
                        .with_attr("class", "footnote-backref")
                        .with_attr("data-footnote-backref", "")
                        .with_attr("aria-label", "Back to reference")
                        .with_children(vec![Node::text("\u{21a9}")])
                        .into(),
                );
                Element::new("li")
                    .with_attr("id", format!("fn-{}", id))
                    .with_children(children)
                    .into()
            })
            .collect();

        Some(
            Element::new("section")
                .with_attr("class", "footnotes")
                .with_attr("data-footnotes", "")
                .with_children(vec![Element::new("ol").with_children(items).into()])
                .into(),
        )
    }
}

fn footnote_id(label: &str) -> String {
    let id = slugify(label);
    if id.is_empty() {
        label.to_string()
    } else {
        id
    }
}

struct Lowerer {
    stack: Vec<Frame>,
    table: TableState,
    footnotes: Footnotes,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                opener: Opener::Root,
                kind: FrameKind::Transparent,
                children: Vec::new(),
            }],
            table: TableState::default(),
            footnotes: Footnotes::default(),
        }
    }

    fn push(&mut self, event: MdEvent) -> Result<(), TransformError> {
        match event {
            MdEvent::Markdown(event) => self.markdown(event),
            MdEvent::DirectiveStart(directive) => {
                self.open(Opener::Directive, directive_frame(directive));
                Ok(())
            }
            MdEvent::DirectiveEnd => self.close(Opener::Directive),
            MdEvent::AdmonitionStart(admonition) => {
                self.open(Opener::Admonition, admonition_frame(admonition));
                Ok(())
            }
            MdEvent::AdmonitionEnd => self.close(Opener::Admonition),
            MdEvent::Math(math) => {
                self.append(math_node(math));
                Ok(())
            }
            MdEvent::Fence(line) => {
                self.append(
                    Element::new("p")
                        .with_children(vec![Node::text(line)])
                        .into(),
                );
                Ok(())
            }
        }
    }

    fn markdown(&mut self, event: Event<'static>) -> Result<(), TransformError> {
        match event {
            Event::Start(tag) => {
                let kind = self.start_tag(tag);
                self.open(Opener::Markdown, kind);
            }
            Event::End(_) => return self.close(Opener::Markdown),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.append(
                Element::new("code")
                    .with_children(vec![Node::text(code.to_string())])
                    .into(),
            ),
            Event::InlineMath(tex) => self.append(math_node(Math {
                display: false,
                tex: tex.to_string(),
            })),
            Event::DisplayMath(tex) => self.append(math_node(Math {
                display: true,
                tex: tex.to_string(),
            })),
            Event::Html(html) | Event::InlineHtml(html) => self.append(Node::Raw(html.to_string())),
            Event::FootnoteReference(label) => {
                let number = self.footnotes.reference(&label);
                let id = footnote_id(&label);
                self.append(
                    Element::new("sup")
                        .with_children(vec![Element::new("a")
                            .with_attr("href", format!("#fn-{}", id))
                            .with_attr("id", format!("fnref-{}", id))
                            .with_attr("data-footnote-ref", "")
                            .with_children(vec![Node::text(number.to_string())])
                            .into()])
                        .into(),
                );
            }
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => self.append(Element::new("br").into()),
            Event::Rule => self.append(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                self.mark_task_item();
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                self.append(input.into());
            }
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'static>) -> FrameKind {
        match tag {
            Tag::Paragraph => element("p"),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let mut el = Element::new(format!("h{}", level as u8));
                if let Some(id) = id {
                    el.set_attr("id", id.to_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
                    el.set_attr("class", classes.join(" "));
                }
                for (name, value) in attrs {
                    el.set_attr(name.to_string(), value.map(|v| v.to_string()).unwrap_or_default());
                }
                FrameKind::Element(el)
            }
            Tag::BlockQuote(_) => element("blockquote"),
            Tag::CodeBlock(kind) => FrameKind::CodeBlock {
                info: match kind {
                    CodeBlockKind::Fenced(info) => FenceInfo::parse(&info),
                    CodeBlockKind::Indented => FenceInfo::default(),
                },
                text: String::new(),
            },
            Tag::List(Some(start)) => {
                let mut el = Element::new("ol");
                if start != 1 {
                    el.set_attr("start", start.to_string());
                }
                FrameKind::Element(el)
            }
            Tag::List(None) => element("ul"),
            Tag::Item => element("li"),
            Tag::FootnoteDefinition(label) => FrameKind::FootnoteDefinition(label.to_string()),
            Tag::Table(alignments) => {
                self.table = TableState {
                    alignments,
                    ..TableState::default()
                };
                element("table")
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell = 0;
                FrameKind::TableHead
            }
            Tag::TableRow => {
                self.table.cell = 0;
                element("tr")
            }
            Tag::TableCell => {
                let mut el = Element::new(if self.table.in_head { "th" } else { "td" });
                let align = match self.table.alignments.get(self.table.cell) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    el.set_attr("style", format!("text-align: {}", align));
                }
                self.table.cell += 1;
                FrameKind::Element(el)
            }
            Tag::Emphasis => element("em"),
            Tag::Strong => element("strong"),
            Tag::Strikethrough => element("del"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email && !dest_url.starts_with("mailto:") {
                    format!("mailto:{}", dest_url)
                } else {
                    dest_url.to_string()
                };
                let mut el = Element::new("a").with_attr("href", href);
                if !title.is_empty() {
                    el.set_attr("title", title.to_string());
                }
                FrameKind::Element(el)
            }
            Tag::Image { dest_url, title, .. } => {
                let mut el = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    el.set_attr("title", title.to_string());
                }
                FrameKind::Image(el)
            }
            Tag::MetadataBlock(_) => FrameKind::Skip,
            _ => FrameKind::Transparent,
        }
    }

    fn open(&mut self, opener: Opener, mut kind: FrameKind) {
        let children = match &mut kind {
            FrameKind::Element(el) => std::mem::take(&mut el.children),
            _ => Vec::new(),
        };
        self.stack.push(Frame {
            opener,
            kind,
            children,
        });
    }

    fn close(&mut self, opener: Opener) -> Result<(), TransformError> {
        let top = self
            .stack
            .last()
            .map(|f| f.opener)
            .unwrap_or(Opener::Root);
        if top == Opener::Root {
            return Err(TransformError::new(format!(
                "end of {} without a matching start",
                opener.describe()
            )));
        }
        if top != opener {
            return Err(TransformError::new(format!(
                "end of {} while {} is still open",
                opener.describe(),
                top.describe()
            )));
        }

        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        let children = frame.children;
        match frame.kind {
            FrameKind::Element(mut el) => {
                el.children = children;
                if el.tag == "table" {
                    el.children = group_table_body(el.children);
                }
                self.append(el.into());
            }
            FrameKind::Component(mut c) => {
                c.children = children;
                self.append(c.into());
            }
            FrameKind::CodeBlock { info, text } => self.append(code_block(info, text)),
            FrameKind::Image(el) => {
                let alt = text_content(&children);
                self.append(el.with_attr("alt", alt).into());
            }
            FrameKind::TableHead => {
                self.table.in_head = false;
                self.append(
                    Element::new("thead")
                        .with_children(vec![Element::new("tr").with_children(children).into()])
                        .into(),
                );
            }
            FrameKind::FootnoteDefinition(label) => {
                self.footnotes.definitions.push((label, children));
            }
            FrameKind::Transparent => {
                for child in children {
                    self.append(child);
                }
            }
            FrameKind::Skip => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(frame) = self.stack.last_mut() {
            match &mut frame.kind {
                FrameKind::CodeBlock { text: code, .. } => code.push_str(text),
                FrameKind::Skip => {}
                _ => frame.children.push(Node::text(text)),
            }
        }
    }

    fn append(&mut self, node: Node) {
        if let Some(frame) = self.stack.last_mut() {
            match frame.kind {
                FrameKind::Skip => {}
                _ => frame.children.push(node),
            }
        }
    }

    fn mark_task_item(&mut self) {
        let item = self.stack.iter_mut().rev().find_map(|frame| match &mut frame.kind {
            FrameKind::Element(el) if el.tag == "li" => Some(el),
            _ => None,
        });
        if let Some(li) = item {
            li.set_attr("class", "task-list-item");
        }
    }

    fn finish(mut self) -> Result<Root, TransformError> {
        if self.stack.len() > 1 {
            let open = self.stack.last().map(|f| f.opener).unwrap_or(Opener::Root);
            return Err(TransformError::new(format!(
                "unclosed {} at end of document",
                open.describe()
            )));
        }

        let mut children = self
            .stack
            .pop()
            .map(|frame| frame.children)
            .unwrap_or_default();
        if let Some(section) = std::mem::take(&mut self.footnotes).into_section() {
            children.push(section);
        }
        Ok(Root { children })
    }
}

fn element(tag: &str) -> FrameKind {
    FrameKind::Element(Element::new(tag))
}

/// Unknown directives become a tagged `div`; a label becomes its first child.
fn directive_frame(directive: Directive) -> FrameKind {
    let Directive {
        name,
        label,
        attributes,
    } = directive;

    let mut class = format!("directive directive-{}", name);
    let mut el = Element::new("div");
    for (key, value) in attributes {
        if key == "class" {
            class.push(' ');
            class.push_str(&value);
        } else {
            el.set_attr(key, value);
        }
    }
    el.set_attr("class", class);
    el.set_attr("data-directive", name);

    if let Some(label) = label {
        el.children.push(
            Element::new("p")
                .with_attr("class", "directive-label")
                .with_children(label_nodes(&label))
                .into(),
        );
    }
    FrameKind::Element(el)
}

/// Admonition labels are passed as plain text (`label`) and as rendered
/// inline markup (`label-html`).
fn admonition_frame(admonition: Admonition) -> FrameKind {
    let mut node = ComponentNode::new(admonition.kind.clone()).with_prop("kind", admonition.kind);
    if let Some(label) = admonition.label {
        let children = label_nodes(&label);
        node = node
            .with_prop("label", text_content(&children))
            .with_prop(
                LABEL_HTML,
                render(&Root { children }, &ComponentBinding::new()),
            );
    }
    for (key, value) in admonition.attributes {
        node = node.with_prop(key, value);
    }
    FrameKind::Component(node)
}

/// Inline Markdown of a directive label, without the wrapping paragraph.
fn label_nodes(label: &str) -> Vec<Node> {
    let events = parse_markdown(label, Options::ENABLE_STRIKETHROUGH);
    match lower(events) {
        Ok(root) => root
            .children
            .into_iter()
            .flat_map(|node| match node {
                Node::Element(el) if el.tag == "p" => el.children,
                other => vec![other],
            })
            .collect(),
        Err(_) => vec![Node::text(label)],
    }
}

fn math_node(math: Math) -> Node {
    let name = if math.display { MATH_DISPLAY } else { MATH_INLINE };
    ComponentNode::new(name).with_prop("tex", math.tex).into()
}

/// `<pre><code class="language-x" data-title="…">` with the raw code as text.
fn code_block(info: FenceInfo, text: String) -> Node {
    let mut code = Element::new("code");
    if let Some(language) = &info.language {
        code.set_attr("class", format!("language-{}", language));
    }
    if let Some(title) = info.title {
        code.set_attr("data-title", title);
    }
    code.children.push(Node::text(text));
    Element::new("pre").with_children(vec![code.into()]).into()
}

/// Wrap the body rows of a table in `<tbody>`.
fn group_table_body(children: Vec<Node>) -> Vec<Node> {
    let (head, rows): (Vec<Node>, Vec<Node>) = children
        .into_iter()
        .partition(|node| matches!(node, Node::Element(el) if el.tag == "thead"));

    let mut out = head;
    if !rows.is_empty() {
        out.push(Element::new("tbody").with_children(rows).into());
    }
    out
}
