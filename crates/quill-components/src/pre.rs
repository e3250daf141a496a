//! Code block wrapper: language header, copy button, theme visibility.

use quill_mdx::render::{escape_attr, escape_text};
use quill_mdx::{Component, Props};

/// Renders a highlighted `pre` inside a bordered wrapper.
///
/// The wrapper carries `code-block-{theme}` so the stylesheet can hide the
/// variant that does not match the page theme.
#[derive(Debug, Clone, Default)]
pub struct Pre;

impl Component for Pre {
    fn render(&self, props: &Props<'_>, children: &str) -> String {
        let language = props.get("data-language").unwrap_or("plaintext");
        let theme = props.get("data-theme");

        let mut class = String::from("code-block");
        if let Some(theme) = theme {
            class.push_str(" code-block-");
            class.push_str(theme);
        }

        let attrs: String = props
            .attrs
            .iter()
            .map(|(name, value)| format!(r#" {}="{}""#, name, escape_attr(value)))
            .collect();

        format!(
            r#"<div class="{class}" data-theme="{theme}"><div class="code-block-header"><span class="code-block-language">{language_text}</span><button type="button" class="copy-button" aria-label="Copy code" data-copy="{copy}">Copy</button></div><pre{attrs}>{children}</pre></div>"#,
            class = escape_attr(&class),
            theme = escape_attr(theme.unwrap_or("")),
            language_text = escape_text(language),
            copy = escape_attr(props.text),
        )
    }
}
