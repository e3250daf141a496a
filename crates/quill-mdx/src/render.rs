//! Final rendering of the HTML tree, consulting the component binding.

use crate::binding::{ComponentBinding, Props, LABEL_HTML};
use crate::hast::{text_content, ComponentNode, Element, Node, Root};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Render a tree to HTML. Names present in `binding` are rendered by their
/// component; everything else renders as plain HTML.
pub fn render(root: &Root, binding: &ComponentBinding) -> String {
    let mut out = String::new();
    render_nodes(&root.children, binding, &mut out);
    out
}

fn render_nodes(nodes: &[Node], binding: &ComponentBinding, out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(el) => render_element(el, binding, out),
            Node::Component(c) => render_component(c, binding, out),
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Raw(html) => out.push_str(html),
        }
    }
}

fn render_element(el: &Element, binding: &ComponentBinding, out: &mut String) {
    if let Some(component) = binding.get(&el.tag) {
        let children = render_to_string(&el.children, binding);
        let text = el.text_content();
        let props = Props {
            name: &el.tag,
            attrs: &el.attrs,
            text: &text,
        };
        out.push_str(&component.render(&props, &children));
        return;
    }

    out.push('<');
    out.push_str(&el.tag);
    push_attrs(&el.attrs, out);
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }

    render_nodes(&el.children, binding, out);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn render_component(node: &ComponentNode, binding: &ComponentBinding, out: &mut String) {
    let children = render_to_string(&node.children, binding);

    match binding.get(&node.name) {
        Some(component) => {
            let text = text_content(&node.children);
            let props = Props {
                name: &node.name,
                attrs: &node.props,
                text: &text,
            };
            out.push_str(&component.render(&props, &children));
        }
        None => out.push_str(&fallback_component(node, &children)),
    }
}

/// Default markup for custom nodes nobody bound: an `aside` tagged with the
/// node name, titled by its label props when present.
fn fallback_component(node: &ComponentNode, children: &str) -> String {
    let mut out = format!(
        r#"<aside class="admonition admonition-{name}" data-admonition="{name}">"#,
        name = escape_attr(&node.name)
    );
    let title = match (node.prop(LABEL_HTML), node.prop("label")) {
        (Some(html), _) => Some(html.to_string()),
        (None, Some(label)) => Some(escape_text(label)),
        (None, None) => None,
    };
    if let Some(title) = title {
        out.push_str(&format!(r#"<p class="admonition-title">{}</p>"#, title));
    }
    out.push_str(children);
    out.push_str("</aside>");
    out
}

fn render_to_string(nodes: &[Node], binding: &ComponentBinding) -> String {
    let mut out = String::new();
    render_nodes(nodes, binding, &mut out);
    out
}

fn push_attrs(attrs: &[(String, String)], out: &mut String) {
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for use inside double quotes.
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
