//! Table of contents synthesized from the document's headings.

use serde::Serialize;

use super::{HtmlTransform, TransformContext, TransformError};
use crate::hast::{visit_elements_mut, Element, Node, Root};

/// A heading listed in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub title: String,
    pub id: String,
    pub level: u8,
}

/// Collects identified headings of the configured levels and inserts a
/// nested `<nav class="toc">` at the start of the document.
#[derive(Debug)]
pub struct TableOfContents {
    levels: Vec<u8>,
}

impl TableOfContents {
    pub fn new(levels: Vec<u8>) -> Self {
        Self { levels }
    }
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self::new(vec![2, 3, 4])
    }
}

impl HtmlTransform for TableOfContents {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn transform(
        &self,
        root: &mut Root,
        ctx: &mut TransformContext<'_>,
    ) -> Result<(), TransformError> {
        let mut entries = Vec::new();
        visit_elements_mut(&mut root.children, &mut |el| {
            let Some(level) = el.heading_level() else {
                return;
            };
            if !self.levels.contains(&level) {
                return;
            }
            if let Some(id) = el.attr("id") {
                entries.push(TocEntry {
                    title: el.text_content().trim().to_string(),
                    id: id.to_string(),
                    level,
                });
            }
        });

        let Some(top) = entries.iter().map(|e| e.level).min() else {
            return Ok(());
        };

        let mut pos = 0;
        let list = build_list(&entries, &mut pos, top, 1);
        root.children.insert(
            0,
            Element::new("nav")
                .with_attr("class", "toc")
                .with_children(vec![list.into()])
                .into(),
        );

        ctx.toc = entries;
        Ok(())
    }
}

/// Build the `<ol>` for headings of `level`, consuming deeper entries into
/// nested lists and stopping at the first shallower one.
fn build_list(entries: &[TocEntry], pos: &mut usize, level: u8, depth: u8) -> Element {
    let mut items: Vec<Element> = Vec::new();

    while let Some(entry) = entries.get(*pos) {
        if entry.level < level {
            break;
        }

        if entry.level == level {
            items.push(item(entry));
            *pos += 1;
            continue;
        }

        let nested = build_list(entries, pos, level + 1, depth + 1);
        match items.last_mut() {
            Some(li) => li.children.push(nested.into()),
            None => items.push(
                Element::new("li")
                    .with_attr("class", format!("toc-item toc-item-h{}", level))
                    .with_children(vec![nested.into()]),
            ),
        }
    }

    Element::new("ol")
        .with_attr("class", format!("toc-level toc-level-{}", depth))
        .with_children(items.into_iter().map(Node::Element).collect())
}

fn item(entry: &TocEntry) -> Element {
    let link = Element::new("a")
        .with_attr("class", format!("toc-link toc-link-h{}", entry.level))
        .with_attr("href", format!("#{}", entry.id))
        .with_children(vec![Node::text(entry.title.as_str())]);

    Element::new("li")
        .with_attr("class", format!("toc-item toc-item-h{}", entry.level))
        .with_children(vec![link.into()])
}
