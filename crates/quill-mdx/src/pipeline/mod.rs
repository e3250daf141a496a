//! The two-stage transform pipeline.
//!
//! Stage A rewrites the Markdown-layer event tree, stage B rewrites the HTML
//! tree lowered from it. Within each stage the transforms run in the order
//! they were registered, and [`PipelineBuilder`] registers them in the one
//! order that is correct.

pub mod admonition;
pub mod directive;
pub mod gfm;
pub mod headings;
pub mod highlight;
pub mod lower;
pub mod math;
pub mod toc;

use pulldown_cmark::Options;

use crate::binding::ComponentBinding;
use crate::events::MdEvent;
use crate::hast::Root;
use crate::parser::parse_markdown;
use crate::render::render;

pub use admonition::{Admonitions, DEFAULT_ADMONITION_KINDS};
pub use directive::Directives;
pub use gfm::Gfm;
pub use headings::{AutolinkHeadings, HeadingSlugs};
pub use highlight::{Highlight, HighlightThemes};
pub use math::{ExtractMath, RenderMath};
pub use toc::{TableOfContents, TocEntry};

/// Per-document state shared by the transforms of one compilation.
#[derive(Debug)]
pub struct TransformContext<'a> {
    /// Slug of the document being compiled
    pub slug: &'a str,

    /// Table of contents collected by the TOC step
    pub toc: Vec<TocEntry>,
}

impl<'a> TransformContext<'a> {
    pub fn new(slug: &'a str) -> Self {
        Self {
            slug,
            toc: Vec::new(),
        }
    }
}

/// A failure inside a single transform.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A Markdown-layer transform.
pub trait MarkdownTransform: Send + Sync {
    /// Stage name used in diagnostics
    fn name(&self) -> &'static str;

    /// Parser extensions this transform relies on.
    fn parser_options(&self) -> Options {
        Options::empty()
    }

    fn transform(
        &self,
        events: Vec<MdEvent>,
        ctx: &mut TransformContext<'_>,
    ) -> Result<Vec<MdEvent>, TransformError>;
}

/// An HTML-layer transform.
pub trait HtmlTransform: Send + Sync {
    /// Stage name used in diagnostics
    fn name(&self) -> &'static str;

    fn transform(&self, root: &mut Root, ctx: &mut TransformContext<'_>)
        -> Result<(), TransformError>;
}

/// A document compilation failure, naming the document and the stage.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to compile `{slug}` at stage `{stage}`: {message}")]
pub struct CompileError {
    pub slug: String,
    pub stage: String,
    pub message: String,
}

impl CompileError {
    fn new(slug: &str, stage: &str, error: TransformError) -> Self {
        Self {
            slug: slug.to_string(),
            stage: stage.to_string(),
            message: error.message,
        }
    }
}

/// Errors raised while assembling a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unknown highlight theme: {0}")]
    UnknownTheme(String),

    #[error("Failed to load highlight theme {name}: {message}")]
    InvalidTheme { name: String, message: String },

    #[error("Invalid TOC heading level {0} (expected 1-6)")]
    InvalidTocLevel(u8),
}

/// Output of compiling one document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Rendered HTML fragment
    pub html: String,

    /// Headings collected for the table of contents
    pub toc: Vec<TocEntry>,
}

/// Tunables of the standard pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub themes: HighlightThemes,

    /// Heading levels listed in the table of contents
    pub toc_levels: Vec<u8>,

    /// Directive names treated as admonitions
    pub admonition_kinds: Vec<String>,

    /// Class of the anchor wrapped around heading content
    pub anchor_class: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            themes: HighlightThemes::default(),
            toc_levels: vec![2, 3, 4],
            admonition_kinds: DEFAULT_ADMONITION_KINDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            anchor_class: "anchor".to_string(),
        }
    }
}

/// A compiled, immutable transform chain plus its component binding.
pub struct Pipeline {
    markdown: Vec<Box<dyn MarkdownTransform>>,
    html: Vec<Box<dyn HtmlTransform>>,
    binding: ComponentBinding,
    options: Options,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Stage names in execution order, Markdown layer first.
    pub fn stages(&self) -> Vec<&'static str> {
        self.markdown
            .iter()
            .map(|t| t.name())
            .chain(self.html.iter().map(|t| t.name()))
            .collect()
    }

    pub fn binding(&self) -> &ComponentBinding {
        &self.binding
    }

    /// Compile a document body (frontmatter already removed).
    pub fn compile(&self, slug: &str, body: &str) -> Result<Compiled, CompileError> {
        let mut ctx = TransformContext::new(slug);

        let mut events = parse_markdown(body, self.options);
        for transform in &self.markdown {
            events = transform
                .transform(events, &mut ctx)
                .map_err(|e| CompileError::new(slug, transform.name(), e))?;
        }

        let mut root = lower::lower(events).map_err(|e| CompileError::new(slug, "lower", e))?;
        for transform in &self.html {
            transform
                .transform(&mut root, &mut ctx)
                .map_err(|e| CompileError::new(slug, transform.name(), e))?;
        }

        let html = render(&root, &self.binding);
        tracing::debug!(slug, bytes = html.len(), "compiled document");

        Ok(Compiled {
            html,
            toc: ctx.toc,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages())
            .field("binding", &self.binding)
            .finish()
    }
}

/// Assembles the standard pipeline.
///
/// Stage A: gfm, directive, admonition, math.
/// Stage B: highlight, slug, autolink-headings, toc, math.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    binding: ComponentBinding,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Components used during final rendering.
    pub fn binding(mut self, binding: ComponentBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let PipelineConfig {
            themes,
            toc_levels,
            admonition_kinds,
            anchor_class,
        } = self.config;

        if let Some(&level) = toc_levels.iter().find(|&&l| !(1..=6).contains(&l)) {
            return Err(PipelineError::InvalidTocLevel(level));
        }

        let markdown: Vec<Box<dyn MarkdownTransform>> = vec![
            Box::new(Gfm::new()),
            Box::new(Directives::new()),
            Box::new(Admonitions::new(admonition_kinds)),
            Box::new(ExtractMath::new()),
        ];

        let slugs = HeadingSlugs::new();
        let anchors = AutolinkHeadings::after(&slugs, anchor_class);
        let html: Vec<Box<dyn HtmlTransform>> = vec![
            Box::new(Highlight::new(&themes)?),
            Box::new(slugs),
            Box::new(anchors),
            Box::new(TableOfContents::new(toc_levels)),
            Box::new(RenderMath::new()),
        ];

        let options = markdown
            .iter()
            .fold(Options::empty(), |opts, t| opts | t.parser_options());

        Ok(Pipeline {
            markdown,
            html,
            binding: self.binding,
            options,
        })
    }
}
