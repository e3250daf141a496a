//! MDX compiler for quill posts.
//!
//! A post is YAML frontmatter followed by a Markdown body with directives and
//! math. Compiling it runs the body through a two-stage transform pipeline
//! (Markdown layer, then HTML layer) and renders the result through a
//! [`ComponentBinding`] supplied by the presentation layer.

pub mod binding;
pub mod codeblock;
pub mod enrich;
pub mod events;
pub mod frontmatter;
pub mod hast;
pub mod parser;
pub mod pipeline;
pub mod post;
pub mod render;
pub mod slug;

pub use binding::{Component, ComponentBinding, Props, LABEL_HTML};
pub use enrich::{enrich, reading_time, slug_from_path, SOURCE_EXTENSION};
pub use frontmatter::{parse_document, Frontmatter, FrontmatterError, PostDate};
pub use pipeline::{
    CompileError, Compiled, HighlightThemes, Pipeline, PipelineBuilder, PipelineConfig,
    PipelineError, TocEntry, DEFAULT_ADMONITION_KINDS,
};
pub use post::{compile_post, CompiledPost, DocumentError};
