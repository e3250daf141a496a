//! Owned HTML syntax tree produced from the Markdown layer.
//!
//! HTML-layer transforms rewrite this tree in place; [`render`](crate::render)
//! turns it into markup.

/// Root of a document's HTML tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub children: Vec<Node>,
}

/// A node in the HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A regular HTML element.
    Element(Element),

    /// A named custom node rendered by a bound component (admonitions, math).
    Component(ComponentNode),

    /// Text content, escaped on output.
    Text(String),

    /// Markup passed through verbatim.
    Raw(String),
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A custom node with no HTML meaning of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub name: String,
    pub props: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_attr(&mut self.attrs, name.into(), value.into());
    }

    /// Check whether the `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Heading rank for `h1`..`h6`.
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        text_content(&self.children)
    }
}

impl ComponentNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_attr(&mut self.props, name.into(), value.into());
        self
    }

    pub fn prop(&self, name: &str) -> Option<&str> {
        find_attr(&self.props, name)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Component(c) => &c.children,
            Node::Text(_) | Node::Raw(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(el) => Some(&mut el.children),
            Node::Component(c) => Some(&mut c.children),
            Node::Text(_) | Node::Raw(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<ComponentNode> for Node {
    fn from(c: ComponentNode) -> Self {
        Node::Component(c)
    }
}

/// Concatenated text of a node list. Raw markup contributes nothing.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Raw(_) => {}
            other => collect_text(other.children(), out),
        }
    }
}

/// Visit every element in document order, depth first, parents before
/// children.
pub fn visit_elements_mut(nodes: &mut [Node], f: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
        }
        if let Some(children) = node.children_mut() {
            visit_elements_mut(children, f);
        }
    }
}

/// Rebuild a node list bottom-up, letting `f` replace each node.
pub fn map_nodes<E>(
    nodes: Vec<Node>,
    f: &mut impl FnMut(Node) -> Result<Node, E>,
) -> Result<Vec<Node>, E> {
    nodes
        .into_iter()
        .map(|mut node| {
            if let Some(children) = node.children_mut() {
                let taken = std::mem::take(children);
                *children = map_nodes(taken, f)?;
            }
            f(node)
        })
        .collect()
}

fn find_attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn set_attr(attrs: &mut Vec<(String, String)>, name: String, value: String) {
    match attrs.iter_mut().find(|(k, _)| *k == name) {
        Some(slot) => slot.1 = value,
        None => attrs.push((name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_text_content() {
        let el = Element::new("h2").with_children(vec![
            Node::text("Hello "),
            Element::new("em")
                .with_children(vec![Node::text("World")])
                .into(),
            Node::Raw("<br>".to_string()),
        ]);

        assert_eq!(el.text_content(), "Hello World");
    }

    #[test]
    fn replaces_attributes() {
        let mut el = Element::new("a").with_attr("class", "x");
        el.set_attr("class", "anchor");

        assert_eq!(el.attrs.len(), 1);
        assert!(el.has_class("anchor"));
        assert_eq!(el.heading_level(), None);
    }

    #[test]
    fn maps_bottom_up() {
        let nodes = vec![Element::new("p")
            .with_children(vec![Node::text("a")])
            .into()];

        let mapped: Result<Vec<Node>, ()> = map_nodes(nodes, &mut |node| {
            Ok(match node {
                Node::Text(t) => Node::Text(t.to_uppercase()),
                other => other,
            })
        });

        assert_eq!(text_content(&mapped.unwrap()), "A");
    }
}
