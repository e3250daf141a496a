//! Compiling one post: frontmatter, enrichment and the transform pipeline.

use serde::Serialize;

use crate::enrich::enrich;
use crate::frontmatter::{parse_document, Frontmatter, FrontmatterError};
use crate::pipeline::{CompileError, Pipeline, TocEntry};

/// A fully compiled post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledPost {
    /// Rendered HTML of the body
    pub content: String,

    /// Enriched frontmatter
    pub frontmatter: Frontmatter,

    pub toc: Vec<TocEntry>,
}

impl CompiledPost {
    pub fn slug(&self) -> &str {
        self.frontmatter.slug.as_deref().unwrap_or_default()
    }
}

/// Why a single document failed to compile.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid frontmatter in `{slug}`: {source}")]
    Parse {
        slug: String,
        #[source]
        source: FrontmatterError,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl DocumentError {
    pub fn slug(&self) -> &str {
        match self {
            DocumentError::Parse { slug, .. } => slug,
            DocumentError::Compile(e) => &e.slug,
        }
    }

    /// The stage that failed: `frontmatter` or a transform name.
    pub fn stage(&self) -> &str {
        match self {
            DocumentError::Parse { .. } => "frontmatter",
            DocumentError::Compile(e) => &e.stage,
        }
    }
}

/// Compile the source text of the post named `slug`.
pub fn compile_post(
    pipeline: &Pipeline,
    slug: &str,
    source: &str,
) -> Result<CompiledPost, DocumentError> {
    let (frontmatter, body) = parse_document(source).map_err(|source| DocumentError::Parse {
        slug: slug.to_string(),
        source,
    })?;

    let frontmatter = enrich(frontmatter, body, slug);
    let compiled = pipeline.compile(slug, body)?;

    Ok(CompiledPost {
        content: compiled.html,
        frontmatter,
        toc: compiled.toc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::builder().build().unwrap()
    }

    #[test]
    fn compiles_and_enriches() {
        let source = "---\ntitle: Hello\ndate: 2024-05-01\n---\n## Hello World\n\nSome words here.\n";

        let post = compile_post(&pipeline(), "hello", source).unwrap();

        assert_eq!(post.slug(), "hello");
        assert_eq!(post.frontmatter.title, "Hello");
        assert_eq!(post.frontmatter.reading_time.as_deref(), Some("1 min "));
        assert!(post.content.contains("id=\"hello-world\""));
        assert_eq!(post.toc.len(), 1);
    }

    #[test]
    fn reports_frontmatter_failures() {
        let err = compile_post(&pipeline(), "bad", "---\ndate: 2024-05-01\n---\nbody").unwrap_err();

        assert_eq!(err.slug(), "bad");
        assert_eq!(err.stage(), "frontmatter");
        assert!(matches!(
            err,
            DocumentError::Parse {
                source: FrontmatterError::MissingField("title"),
                ..
            }
        ));
    }

    #[test]
    fn reports_failing_transform() {
        let source = "---\ntitle: T\ndate: 2024-05-01\n---\n:::note\nunclosed\n";

        let err = compile_post(&pipeline(), "open", source).unwrap_err();

        assert_eq!(err.stage(), "directive");
        assert!(err.to_string().contains("`open`"));
    }
}
