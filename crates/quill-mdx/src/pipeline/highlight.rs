//! Code syntax highlighting using syntect, rendered once per theme.

use std::io::Cursor;
use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::{HtmlTransform, PipelineError, TransformContext, TransformError};
use crate::codeblock::PLAIN_TEXT;
use crate::hast::{map_nodes, text_content, Element, Node, Root};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

const VITESSE_BLACK: &[u8] = include_bytes!("../../themes/vitesse-black.tmTheme");
const VITESSE_LIGHT: &[u8] = include_bytes!("../../themes/vitesse-light.tmTheme");

/// Names of the dark and light highlight themes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightThemes {
    pub dark: String,
    pub light: String,
}

impl Default for HighlightThemes {
    fn default() -> Self {
        Self {
            dark: "vitesse-black".to_string(),
            light: "vitesse-light".to_string(),
        }
    }
}

/// Resolve a theme by name: the bundled vitesse themes first, then
/// syntect's defaults.
fn load_theme(name: &str) -> Result<Theme, PipelineError> {
    let bundled = match name {
        "vitesse-black" => Some(VITESSE_BLACK),
        "vitesse-light" => Some(VITESSE_LIGHT),
        _ => None,
    };

    if let Some(bytes) = bundled {
        return ThemeSet::load_from_reader(&mut Cursor::new(bytes)).map_err(|e| {
            PipelineError::InvalidTheme {
                name: name.to_string(),
                message: e.to_string(),
            }
        });
    }

    ThemeSet::load_defaults()
        .themes
        .remove(name)
        .ok_or_else(|| PipelineError::UnknownTheme(name.to_string()))
}

/// Map common fence names onto syntaxes syntect ships with.
fn syntax_token(language: &str) -> &str {
    match language {
        "ts" | "tsx" | "typescript" | "mts" | "cts" | "jsx" | "mjs" | "cjs" => "js",
        "sh" | "shell" | "zsh" | "console" => "bash",
        "yml" => "yaml",
        "mdx" => "md",
        other => other,
    }
}

fn find_syntax(language: &str) -> &'static SyntaxReference {
    let ss = syntax_set();
    let token = syntax_token(language);
    ss.find_syntax_by_token(token)
        .or_else(|| ss.find_syntax_by_extension(token))
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}

struct ThemeVariant {
    /// `dark` or `light`
    key: &'static str,
    name: String,
    theme: Theme,
}

/// Replaces every `pre > code` block with a figure holding one highlighted
/// `pre` per theme, dark first.
pub struct Highlight {
    variants: [ThemeVariant; 2],
}

impl Highlight {
    pub fn new(themes: &HighlightThemes) -> Result<Self, PipelineError> {
        Ok(Self {
            variants: [
                ThemeVariant {
                    key: "dark",
                    name: themes.dark.clone(),
                    theme: load_theme(&themes.dark)?,
                },
                ThemeVariant {
                    key: "light",
                    name: themes.light.clone(),
                    theme: load_theme(&themes.light)?,
                },
            ],
        })
    }

    fn figure(&self, code: &Element) -> Result<Element, TransformError> {
        let language = code
            .attr("class")
            .and_then(|c| {
                c.split_whitespace()
                    .find_map(|class| class.strip_prefix("language-"))
            })
            .unwrap_or(PLAIN_TEXT)
            .to_string();
        let source = text_content(&code.children);
        let syntax = find_syntax(&language);

        let mut children = Vec::with_capacity(3);
        if let Some(title) = code.attr("data-title") {
            children.push(
                Element::new("figcaption")
                    .with_attr("data-rehype-pretty-code-title", "")
                    .with_attr("data-language", language.as_str())
                    .with_children(vec![Node::text(title)])
                    .into(),
            );
        }

        for variant in &self.variants {
            let lines = highlight_lines(&source, syntax, &variant.theme)?;
            let code = Element::new("code")
                .with_attr("data-language", language.as_str())
                .with_attr("data-theme", variant.key)
                .with_attr("style", "display: grid;")
                .with_children(lines);

            let mut pre = Element::new("pre")
                .with_attr("data-language", language.as_str())
                .with_attr("data-theme", variant.key)
                .with_attr("data-theme-name", variant.name.as_str())
                .with_attr("tabindex", "0");
            if let Some(style) = theme_style(&variant.theme) {
                pre.set_attr("style", style);
            }
            children.push(pre.with_children(vec![code.into()]).into());
        }

        Ok(Element::new("figure")
            .with_attr("data-rehype-pretty-code-figure", "")
            .with_children(children))
    }
}

impl std::fmt::Debug for Highlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlight")
            .field("dark", &self.variants[0].name)
            .field("light", &self.variants[1].name)
            .finish()
    }
}

impl HtmlTransform for Highlight {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn transform(
        &self,
        root: &mut Root,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<(), TransformError> {
        let children = std::mem::take(&mut root.children);
        root.children = map_nodes(children, &mut |node| match node {
            Node::Element(pre) if pre.tag == "pre" => match code_child(&pre) {
                Some(code) => self.figure(code).map(Node::Element),
                None => Ok(Node::Element(pre)),
            },
            other => Ok(other),
        })?;
        Ok(())
    }
}

/// The single `code` child of a lowered code block.
fn code_child(pre: &Element) -> Option<&Element> {
    match pre.children.as_slice() {
        [Node::Element(code)] if code.tag == "code" => Some(code),
        _ => None,
    }
}

/// One `<span data-line>` per source line, separated by newlines.
fn highlight_lines(
    source: &str,
    syntax: &SyntaxReference,
    theme: &Theme,
) -> Result<Vec<Node>, TransformError> {
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();

    for (i, line) in LinesWithEndings::from(source).enumerate() {
        let ranges = highlighter
            .highlight_line(line, syntax_set())
            .map_err(|e| TransformError::new(format!("failed to highlight: {}", e)))?;

        let tokens = ranges
            .into_iter()
            .filter_map(|(style, text)| {
                let text = text.trim_end_matches(['\n', '\r']);
                if text.is_empty() {
                    return None;
                }
                Some(
                    Element::new("span")
                        .with_attr("style", format!("color:{}", hex(style.foreground)))
                        .with_children(vec![Node::text(text)])
                        .into(),
                )
            })
            .collect();

        if i > 0 {
            out.push(Node::text("\n"));
        }
        out.push(
            Element::new("span")
                .with_attr("data-line", "")
                .with_children(tokens)
                .into(),
        );
    }

    Ok(out)
}

fn theme_style(theme: &Theme) -> Option<String> {
    let background = theme.settings.background?;
    let mut style = format!("background-color:{}", hex(background));
    if let Some(foreground) = theme.settings.foreground {
        style.push_str(&format!(";color:{}", hex(foreground)));
    }
    Some(style)
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_block(language: Option<&str>, title: Option<&str>, source: &str) -> Root {
        let mut code = Element::new("code");
        if let Some(language) = language {
            code.set_attr("class", format!("language-{}", language));
        }
        if let Some(title) = title {
            code.set_attr("data-title", title);
        }
        code.children.push(Node::text(source));
        Root {
            children: vec![Element::new("pre")
                .with_children(vec![code.into()])
                .into()],
        }
    }

    fn highlight(root: &mut Root) -> Element {
        let mut ctx = TransformContext::new("test");
        Highlight::new(&HighlightThemes::default())
            .unwrap()
            .transform(root, &mut ctx)
            .unwrap();
        match &root.children[0] {
            Node::Element(figure) => figure.clone(),
            other => panic!("expected figure, got {:?}", other),
        }
    }

    fn pres(figure: &Element) -> Vec<&Element> {
        figure
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(el) if el.tag == "pre" => Some(el),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn renders_one_pre_per_theme() {
        let mut root = code_block(Some("ts"), None, "const x = 1;\nlet y = 2;\n");
        let figure = highlight(&mut root);

        assert_eq!(figure.tag, "figure");
        let pres = pres(&figure);
        assert_eq!(pres.len(), 2);
        assert_eq!(pres[0].attr("data-theme"), Some("dark"));
        assert_eq!(pres[0].attr("data-theme-name"), Some("vitesse-black"));
        assert_eq!(pres[0].attr("style"), Some("background-color:#000000;color:#dbd7ca"));
        assert_eq!(pres[1].attr("data-theme"), Some("light"));
        assert_eq!(pres[1].attr("data-theme-name"), Some("vitesse-light"));
        assert_eq!(pres[1].attr("data-language"), Some("ts"));
    }

    #[test]
    fn keeps_source_text_per_line() {
        let mut root = code_block(Some("rust"), None, "fn main() {}\nlet a = 1;\n");
        let figure = highlight(&mut root);

        let pre = pres(&figure)[0];
        let Node::Element(code) = &pre.children[0] else {
            panic!("expected code element");
        };
        let lines: Vec<String> = code
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(line) => Some(line.text_content()),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["fn main() {}", "let a = 1;"]);
    }

    #[test]
    fn falls_back_to_plain_text() {
        let mut root = code_block(None, Some("notes.txt"), "just text\n");
        let figure = highlight(&mut root);

        let Node::Element(caption) = &figure.children[0] else {
            panic!("expected caption");
        };
        assert_eq!(caption.tag, "figcaption");
        assert_eq!(caption.text_content(), "notes.txt");
        assert_eq!(pres(&figure)[0].attr("data-language"), Some("plaintext"));

        let mut root = code_block(Some("no-such-lang"), None, "x\n");
        let figure = highlight(&mut root);
        assert_eq!(pres(&figure)[1].text_content(), "x");
    }

    #[test]
    fn resolves_theme_names() {
        assert!(load_theme("vitesse-black").is_ok());
        assert!(load_theme("InspiredGitHub").is_ok());
        assert!(matches!(
            load_theme("missing"),
            Err(PipelineError::UnknownTheme(name)) if name == "missing"
        ));
    }
}
