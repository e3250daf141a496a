//! Heading ids and the anchors wrapped around heading content.

use super::{HtmlTransform, TransformContext, TransformError};
use crate::hast::{visit_elements_mut, Element, Node, Root};
use crate::slug::Slugger;

/// Gives every heading a per-document unique `id`. Ids already present are
/// kept and never handed out again.
#[derive(Debug, Default)]
pub struct HeadingSlugs;

impl HeadingSlugs {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlTransform for HeadingSlugs {
    fn name(&self) -> &'static str {
        "slug"
    }

    fn transform(
        &self,
        root: &mut Root,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<(), TransformError> {
        let mut slugger = Slugger::new();

        visit_elements_mut(&mut root.children, &mut |el| {
            if let Some(id) = el.attr("id") {
                slugger.reserve(id);
            }
        });

        visit_elements_mut(&mut root.children, &mut |el| {
            if el.heading_level().is_none() || el.attr("id").is_some() {
                return;
            }
            let slug = slugger.slug(&el.text_content());
            if !slug.is_empty() {
                el.set_attr("id", slug);
            }
        });

        Ok(())
    }
}

/// Wraps the content of each heading that has an `id` in a self-link.
#[derive(Debug)]
pub struct AutolinkHeadings {
    class: String,
}

impl AutolinkHeadings {
    /// Anchors for the ids `slugs` assigns; construct it after the slug step
    /// and register it behind it.
    pub fn after(_slugs: &HeadingSlugs, class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

impl HtmlTransform for AutolinkHeadings {
    fn name(&self) -> &'static str {
        "autolink-headings"
    }

    fn transform(
        &self,
        root: &mut Root,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<(), TransformError> {
        visit_elements_mut(&mut root.children, &mut |el| {
            if el.heading_level().is_none() {
                return;
            }
            let Some(id) = el.attr("id").map(str::to_string) else {
                return;
            };

            let content = std::mem::take(&mut el.children);
            el.children = vec![Node::Element(
                Element::new("a")
                    .with_attr("class", self.class.as_str())
                    .with_attr("href", format!("#{}", id))
                    .with_children(content),
            )];
        });
        Ok(())
    }
}
