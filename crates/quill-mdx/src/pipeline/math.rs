//! Math: extraction on the Markdown layer, MathML rendering on the HTML layer.

use latex2mathml::{latex_to_mathml, DisplayStyle};
use pulldown_cmark::{Event, Options, Tag, TagEnd};

use super::{HtmlTransform, MarkdownTransform, TransformContext, TransformError};
use crate::events::{Math, MdEvent};
use crate::hast::{map_nodes, Element, Node, Root};

/// Component node name of inline math.
pub const MATH_INLINE: &str = "math-inline";
/// Component node name of display math.
pub const MATH_DISPLAY: &str = "math-display";

/// Turns `$…$` and `$$…$$` into math nodes carrying their LaTeX.
///
/// A paragraph holding nothing but display math is unwrapped so the
/// rendered block does not end up inside a `<p>`.
#[derive(Debug, Default)]
pub struct ExtractMath;

impl ExtractMath {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownTransform for ExtractMath {
    fn name(&self) -> &'static str {
        "math"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_MATH
    }

    fn transform(
        &self,
        events: Vec<MdEvent>,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<Vec<MdEvent>, TransformError> {
        let events: Vec<MdEvent> = events
            .into_iter()
            .map(|event| match event {
                MdEvent::Markdown(Event::InlineMath(tex)) => MdEvent::Math(Math {
                    display: false,
                    tex: tex.to_string(),
                }),
                MdEvent::Markdown(Event::DisplayMath(tex)) => MdEvent::Math(Math {
                    display: true,
                    tex: tex.to_string(),
                }),
                other => other,
            })
            .collect();

        Ok(unwrap_display_paragraphs(events))
    }
}

fn unwrap_display_paragraphs(events: Vec<MdEvent>) -> Vec<MdEvent> {
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        if !matches!(event, MdEvent::Markdown(Event::Start(Tag::Paragraph))) {
            out.push(event);
            continue;
        }

        let mut inner = Vec::new();
        let mut end = None;
        for e in iter.by_ref() {
            if matches!(e, MdEvent::Markdown(Event::End(TagEnd::Paragraph))) {
                end = Some(e);
                break;
            }
            inner.push(e);
        }

        if only_display_math(&inner) {
            out.extend(
                inner
                    .into_iter()
                    .filter(|e| matches!(e, MdEvent::Math(_))),
            );
        } else {
            out.push(event);
            out.extend(inner);
            out.extend(end);
        }
    }

    out
}

fn only_display_math(events: &[MdEvent]) -> bool {
    let mut seen = false;
    for event in events {
        match event {
            MdEvent::Math(Math { display: true, .. }) => seen = true,
            MdEvent::Markdown(Event::SoftBreak) => {}
            MdEvent::Markdown(Event::Text(t)) if t.trim().is_empty() => {}
            _ => return false,
        }
    }
    seen
}

/// Renders math nodes to MathML.
#[derive(Debug, Default)]
pub struct RenderMath;

impl RenderMath {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlTransform for RenderMath {
    fn name(&self) -> &'static str {
        "math-render"
    }

    fn transform(
        &self,
        root: &mut Root,
        ctx: &mut TransformContext<'_>,
    ) -> Result<(), TransformError> {
        let slug = ctx.slug;
        let children = std::mem::take(&mut root.children);
        root.children = map_nodes(children, &mut |node| match node {
            Node::Component(c) if c.name == MATH_INLINE || c.name == MATH_DISPLAY => {
                let tex = c.prop("tex").ok_or_else(|| {
                    TransformError::new(format!("{} node without TeX", c.name))
                })?;
                let display = c.name == MATH_DISPLAY;

                let el = match to_mathml(tex, display) {
                    Ok(mathml) => math_element(display, vec![Node::Raw(mathml)]),
                    Err(message) => {
                        tracing::warn!(slug, tex, "Cannot render math: {}", message);
                        math_element(display, vec![Node::text(tex)])
                            .with_attr("class", format!("{} math-error", math_class(display)))
                            .with_attr("title", message)
                    }
                };
                Ok(Node::Element(el))
            }
            other => Ok(other),
        })?;
        Ok(())
    }
}

/// Environments the renderer lacks, mapped onto `align` and `matrix`:
/// `(name, begin, end)`.
const ENVIRONMENT_REWRITES: &[(&str, &str, &str)] = &[
    ("aligned", r"\begin{align}", r"\end{align}"),
    ("align*", r"\begin{align}", r"\end{align}"),
    ("gathered", r"\begin{matrix}", r"\end{matrix}"),
    ("split", r"\begin{align}", r"\end{align}"),
    ("cases", r"\left\{\begin{align}", r"\end{align}\right."),
];

fn rewrite_environments(tex: &str) -> Option<String> {
    let mut out = tex.to_string();
    for (name, begin, end) in ENVIRONMENT_REWRITES {
        out = out
            .replace(&format!("\\begin{{{}}}", name), begin)
            .replace(&format!("\\end{{{}}}", name), end);
    }
    (out != tex).then_some(out)
}

fn display_style(display: bool) -> DisplayStyle {
    if display {
        DisplayStyle::Block
    } else {
        DisplayStyle::Inline
    }
}

/// MathML for `tex`, retrying once with unsupported environments rewritten.
fn to_mathml(tex: &str, display: bool) -> Result<String, String> {
    match latex_to_mathml(tex, display_style(display)) {
        Ok(mathml) => Ok(mathml),
        Err(e) => rewrite_environments(tex)
            .and_then(|rewritten| latex_to_mathml(&rewritten, display_style(display)).ok())
            .ok_or_else(|| e.to_string()),
    }
}

fn math_class(display: bool) -> &'static str {
    if display {
        "math math-display"
    } else {
        "math math-inline"
    }
}

fn math_element(display: bool, children: Vec<Node>) -> Element {
    let tag = if display { "div" } else { "span" };
    Element::new(tag)
        .with_attr("class", math_class(display))
        .with_children(children)
}
