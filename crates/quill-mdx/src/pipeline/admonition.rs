//! Admonitions: directives of a known callout kind.

use super::{MarkdownTransform, TransformContext, TransformError};
use crate::events::{Admonition, MdEvent};

/// Callout kinds recognized by default.
pub const DEFAULT_ADMONITION_KINDS: &[&str] = &["note", "tip", "info", "warning", "caution", "danger"];

/// Rewrites directives whose name is one of `kinds` into admonitions.
/// Other directives pass through unchanged.
#[derive(Debug)]
pub struct Admonitions {
    kinds: Vec<String>,
}

impl Admonitions {
    pub fn new(kinds: Vec<String>) -> Self {
        Self { kinds }
    }

    fn is_kind(&self, name: &str) -> bool {
        self.kinds.iter().any(|k| k == name)
    }
}

impl Default for Admonitions {
    fn default() -> Self {
        Self::new(
            DEFAULT_ADMONITION_KINDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        )
    }
}

impl MarkdownTransform for Admonitions {
    fn name(&self) -> &'static str {
        "admonition"
    }

    fn transform(
        &self,
        events: Vec<MdEvent>,
        _ctx: &mut TransformContext<'_>,
    ) -> Result<Vec<MdEvent>, TransformError> {
        // one entry per open directive: whether it became an admonition
        let mut open: Vec<bool> = Vec::new();

        events
            .into_iter()
            .map(|event| match event {
                MdEvent::DirectiveStart(directive) if self.is_kind(&directive.name) => {
                    open.push(true);
                    Ok(MdEvent::AdmonitionStart(Admonition {
                        kind: directive.name,
                        label: directive.label,
                        attributes: directive.attributes,
                    }))
                }
                MdEvent::DirectiveStart(directive) => {
                    open.push(false);
                    Ok(MdEvent::DirectiveStart(directive))
                }
                MdEvent::DirectiveEnd => match open.pop() {
                    Some(true) => Ok(MdEvent::AdmonitionEnd),
                    Some(false) => Ok(MdEvent::DirectiveEnd),
                    None => Err(TransformError::new("directive end without a matching start")),
                },
                other => Ok(other),
            })
            .collect()
    }
}
