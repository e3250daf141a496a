//! Admonition callouts.

use quill_mdx::render::{escape_attr, escape_text};
use quill_mdx::{Component, Props, LABEL_HTML};

const INFO_ICON: &str = r#"<svg viewBox="0 0 16 16" width="16" height="16"><path fill="currentColor" d="M8 1.5a6.5 6.5 0 1 0 0 13 6.5 6.5 0 0 0 0-13ZM0 8a8 8 0 1 1 16 0A8 8 0 0 1 0 8Zm6.5-.25A.75.75 0 0 1 7.25 7h1a.75.75 0 0 1 .75.75v2.75h.25a.75.75 0 0 1 0 1.5h-2a.75.75 0 0 1 0-1.5h.25v-2h-.25a.75.75 0 0 1-.75-.75ZM8 6a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z"/></svg>"#;
const TIP_ICON: &str = r#"<svg viewBox="0 0 16 16" width="16" height="16"><path fill="currentColor" d="M8 1.5c-2.363 0-4 1.69-4 3.75 0 .984.424 1.625.984 2.304l.214.253c.223.264.47.556.673.848.284.411.537.896.621 1.49a.75.75 0 0 1-1.484.211c-.04-.282-.163-.547-.37-.847a8.456 8.456 0 0 0-.542-.68c-.084-.1-.173-.205-.268-.32C3.201 7.75 2.5 6.766 2.5 5.25 2.5 2.31 4.863 0 8 0s5.5 2.31 5.5 5.25c0 1.516-.701 2.5-1.328 3.259-.095.115-.184.22-.268.319-.207.245-.383.453-.541.681-.208.3-.33.565-.37.847a.751.751 0 0 1-1.485-.212c.084-.593.337-1.078.621-1.489.203-.292.45-.584.673-.848.075-.088.147-.173.213-.253.561-.679.985-1.32.985-2.304 0-2.06-1.637-3.75-4-3.75ZM5.75 12h4.5a.75.75 0 0 1 0 1.5h-4.5a.75.75 0 0 1 0-1.5ZM6 15.25a.75.75 0 0 1 .75-.75h2.5a.75.75 0 0 1 0 1.5h-2.5a.75.75 0 0 1-.75-.75Z"/></svg>"#;
const WARNING_ICON: &str = r#"<svg viewBox="0 0 16 16" width="16" height="16"><path fill="currentColor" d="M6.457 1.047c.659-1.234 2.427-1.234 3.086 0l6.082 11.378A1.75 1.75 0 0 1 14.082 15H1.918a1.75 1.75 0 0 1-1.543-2.575Zm1.763.707a.25.25 0 0 0-.44 0L1.698 13.132a.25.25 0 0 0 .22.368h12.164a.25.25 0 0 0 .22-.368Zm.53 3.996v2.5a.75.75 0 0 1-1.5 0v-2.5a.75.75 0 0 1 1.5 0ZM9 11a1 1 0 1 1-2 0 1 1 0 0 1 2 0Z"/></svg>"#;
const DANGER_ICON: &str = r#"<svg viewBox="0 0 16 16" width="16" height="16"><path fill="currentColor" d="M4.47.22A.749.749 0 0 1 5 0h6c.199 0 .389.079.53.22l4.25 4.25c.141.14.22.331.22.53v6a.749.749 0 0 1-.22.53l-4.25 4.25A.749.749 0 0 1 11 16H5a.749.749 0 0 1-.53-.22L.22 11.53A.749.749 0 0 1 0 11V5c0-.199.079-.389.22-.53Zm.84 1.28L1.5 5.31v5.38l3.81 3.81h5.38l3.81-3.81V5.31L10.69 1.5ZM8 4a.75.75 0 0 1 .75.75v3.5a.75.75 0 0 1-1.5 0v-3.5A.75.75 0 0 1 8 4Zm0 8a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z"/></svg>"#;

/// A titled callout box for one admonition kind.
#[derive(Debug, Clone, Default)]
pub struct Admonition;

impl Admonition {
    fn icon(kind: &str) -> &'static str {
        match kind {
            "tip" => TIP_ICON,
            "warning" | "caution" => WARNING_ICON,
            "danger" => DANGER_ICON,
            _ => INFO_ICON,
        }
    }
}

/// Upper-case the first character: `warning` becomes `Warning`.
fn capitalize(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Component for Admonition {
    fn render(&self, props: &Props<'_>, children: &str) -> String {
        let kind = props.get("kind").unwrap_or(props.name);
        let title = match (props.get(LABEL_HTML), props.get("label")) {
            (Some(html), _) => html.to_string(),
            (None, Some(label)) => escape_text(label),
            (None, None) => escape_text(&capitalize(kind)),
        };

        let mut class = format!("admonition admonition-{}", kind);
        if let Some(extra) = props.get("class") {
            class.push(' ');
            class.push_str(extra);
        }
        let id = props
            .get("id")
            .map(|id| format!(r#" id="{}""#, escape_attr(id)))
            .unwrap_or_default();

        format!(
            r#"<aside{id} class="{class}" data-admonition="{kind}" role="note"><div class="admonition-heading"><span class="admonition-icon" aria-hidden="true">{icon}</span><p class="admonition-title">{title}</p></div><div class="admonition-content">{children}</div></aside>"#,
            class = escape_attr(&class),
            kind = escape_attr(kind),
            icon = Self::icon(kind),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(attrs: &[(String, String)]) -> String {
        let props = Props {
            name: "warning",
            attrs,
            text: "",
        };
        Admonition.render(&props, "<p>mind the step</p>")
    }

    #[test]
    fn uses_label_as_title() {
        let html = render(&[
            ("kind".to_string(), "warning".to_string()),
            ("label".to_string(), "Careful".to_string()),
        ]);

        assert!(html.starts_with(r#"<aside class="admonition admonition-warning" data-admonition="warning""#));
        assert!(html.contains(r#"<p class="admonition-title">Careful</p>"#));
        assert!(html.contains(r#"<div class="admonition-content"><p>mind the step</p></div>"#));
    }

    #[test]
    fn prefers_rendered_label_markup() {
        let html = render(&[
            ("kind".to_string(), "warning".to_string()),
            ("label".to_string(), "Use cargo".to_string()),
            (LABEL_HTML.to_string(), "Use <code>cargo</code>".to_string()),
        ]);

        assert!(html.contains(r#"<p class="admonition-title">Use <code>cargo</code></p>"#));
    }

    #[test]
    fn escapes_plain_label() {
        let html = render(&[("label".to_string(), "a < b".to_string())]);

        assert!(html.contains(r#"<p class="admonition-title">a &lt; b</p>"#));
    }

    #[test]
    fn capitalizes_kind_without_label() {
        let html = render(&[
            ("kind".to_string(), "warning".to_string()),
            ("id".to_string(), "heads-up".to_string()),
        ]);

        assert!(html.starts_with(r#"<aside id="heads-up" "#));
        assert!(html.contains(r#"<p class="admonition-title">Warning</p>"#));
    }

    #[test]
    fn falls_back_to_node_name() {
        let html = render(&[]);

        assert!(html.contains(r#"data-admonition="warning""#));
        assert_eq!(capitalize(""), "");
    }
}
