//! The Markdown-layer tree: pulldown-cmark events plus the custom nodes the
//! Markdown transforms introduce.

use pulldown_cmark::Event;

/// One event of the Markdown-layer tree.
///
/// `*Start` / `*End` pairs delimit containers the same way pulldown-cmark's
/// `Start` / `End` do.
#[derive(Debug, Clone, PartialEq)]
pub enum MdEvent {
    /// A plain CommonMark / GFM event.
    Markdown(Event<'static>),

    /// A `:::` container fence line, kept out of inline parsing.
    Fence(String),

    /// Opening of a `:::name[label]{attrs}` container directive.
    DirectiveStart(Directive),
    DirectiveEnd,

    /// Opening of an admonition (a directive of a known callout kind).
    AdmonitionStart(Admonition),
    AdmonitionEnd,

    /// Inline (`$…$`) or display (`$$…$$`) math.
    Math(Math),
}

/// A generic container directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub label: Option<String>,
    pub attributes: Vec<(String, String)>,
}

/// A structured callout block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admonition {
    pub kind: String,
    pub label: Option<String>,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Math {
    pub display: bool,
    /// Raw LaTeX source
    pub tex: String,
}

impl From<Event<'static>> for MdEvent {
    fn from(event: Event<'static>) -> Self {
        MdEvent::Markdown(event)
    }
}
