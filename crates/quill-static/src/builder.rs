//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use quill_components::binding_for;
use quill_mdx::{CompiledPost, Frontmatter, Pipeline, PipelineConfig, PipelineError};

use crate::assets::AssetPipeline;
use crate::index::{adjacent, index_posts, PostError, PostIndex, SourceResult};
use crate::templates::{IndexContext, PostContext, TemplateEngine};

/// Configuration for building the blog.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Content root holding the `.mdx` sources
    pub posts_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Minify CSS output
    pub minify: bool,

    /// Base URL for the site
    pub base_url: String,

    /// Site title
    pub title: String,

    pub pipeline: PipelineConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("posts"),
            output_dir: PathBuf::from("dist"),
            minify: true,
            base_url: "/".to_string(),
            title: "Blog".to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of post pages generated, drafts included
    pub pages: usize,

    /// Number of posts on the index page
    pub listed: usize,

    /// Number of sources that failed to compile
    pub failed: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Posts(#[from] PostError),

    #[error("Failed to assemble pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    index: PostIndex,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a builder whose pipeline renders through the default components.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let binding = binding_for(config.pipeline.admonition_kinds.iter().map(String::as_str));
        let pipeline = Pipeline::builder()
            .config(config.pipeline.clone())
            .binding(binding)
            .build()?;
        let templates =
            TemplateEngine::new().map_err(|e| BuildError::TemplateError(e.to_string()))?;

        Ok(Self {
            index: PostIndex::new(&config.posts_dir, pipeline),
            config,
            templates,
        })
    }

    pub fn index(&self) -> &PostIndex {
        &self.index
    }

    /// Build the site. Posts that fail to compile are logged and skipped.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let results = self.index.compile_all().await?;
        tracing::info!(
            "Compiled {} sources from {}",
            results.len(),
            self.index.root().display()
        );

        let mut posts: Vec<CompiledPost> = Vec::with_capacity(results.len());
        let mut failed = 0;
        for SourceResult { slug, result } in results {
            match result {
                Ok(post) => posts.push(post),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(slug = %slug, stage = e.stage(), "Skipping post: {}", e);
                }
            }
        }

        let listed = index_posts(posts.iter().map(|p| p.frontmatter.clone()).collect());

        // Render and write pages in parallel
        let written: Vec<Result<(), BuildError>> = posts
            .par_iter()
            .map(|post| self.build_post(post, &listed))
            .collect();
        for result in written {
            result?;
        }
        tracing::info!("Wrote {} post pages", posts.len());

        self.build_index(&listed)?;
        self.write_post_index(&listed)?;
        self.generate_assets()?;

        Ok(BuildResult {
            pages: posts.len(),
            listed: listed.len(),
            failed,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    fn post_path(&self, slug: &str) -> PathBuf {
        self.config
            .output_dir
            .join("posts")
            .join(slug)
            .join("index.html")
    }

    /// Render one post page. Drafts are not listed and so get no neighbours.
    fn build_post(&self, post: &CompiledPost, listed: &[Frontmatter]) -> Result<(), BuildError> {
        let adjacent = adjacent(listed, post.slug());

        let html = self
            .templates
            .render_post(&PostContext {
                site_title: self.config.title.clone(),
                base_url: self.config.base_url.clone(),
                post: post.frontmatter.clone(),
                content: post.content.clone(),
                prev: adjacent.prev,
                next: adjacent.next,
            })
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        write_file(&self.post_path(post.slug()), html)?;
        tracing::debug!(slug = post.slug(), "wrote post page");
        Ok(())
    }

    fn build_index(&self, listed: &[Frontmatter]) -> Result<(), BuildError> {
        let html = self
            .templates
            .render_index(&IndexContext {
                site_title: self.config.title.clone(),
                base_url: self.config.base_url.clone(),
                posts: listed.to_vec(),
            })
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        write_file(&self.config.output_dir.join("index.html"), html)
    }

    /// Write the listed posts as JSON for client-side consumers.
    fn write_post_index(&self, listed: &[Frontmatter]) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(listed)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        write_file(&self.config.output_dir.join("posts.json"), json)
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");

        let css = AssetPipeline::generate_css();
        let css = if self.config.minify {
            AssetPipeline::minify_css(&css).unwrap_or_else(|e| {
                tracing::warn!("Serving unminified CSS: {}", e);
                css
            })
        } else {
            css
        };
        write_file(&assets_dir.join("main.css"), css)?;
        write_file(&assets_dir.join("main.js"), AssetPipeline::generate_js())?;

        tracing::info!("Generated assets in {}", assets_dir.display());
        Ok(())
    }
}

fn write_file(path: &Path, contents: String) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
    }
    fs::write(path, contents)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_post(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            posts_dir: root.join("posts"),
            output_dir: root.join("dist"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn builds_blog() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        write_post(
            &posts,
            "first.mdx",
            "---\ntitle: First\ndate: 2024-01-01\n---\n## Intro\n\n:::warning[Careful]\nmind the step\n:::\n",
        );
        write_post(
            &posts,
            "second.mdx",
            "---\ntitle: Second\ndate: 2024-02-01\n---\n```ts\nconst x = 1;\n```\n",
        );
        write_post(
            &posts,
            "wip.mdx",
            "---\ntitle: WIP\ndate: 2024-03-01\ndraft: true\n---\nnot yet\n",
        );

        let builder = StaticBuilder::new(config(temp.path())).unwrap();
        let result = builder.build().await.unwrap();

        assert_eq!(result.pages, 3);
        assert_eq!(result.listed, 2);
        assert_eq!(result.failed, 0);

        let out = temp.path().join("dist");
        let first = fs::read_to_string(out.join("posts/first/index.html")).unwrap();
        assert!(first.contains(r#"<p class="admonition-title">Careful</p>"#));
        assert!(first.contains(r#"<nav class="toc">"#));
        assert!(first.contains("post-nav-prev"));

        let second = fs::read_to_string(out.join("posts/second/index.html")).unwrap();
        assert!(second.contains("code-block-dark"));
        assert!(second.contains("code-block-light"));

        let draft = fs::read_to_string(out.join("posts/wip/index.html")).unwrap();
        assert!(!draft.contains("post-nav"));

        let index: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(out.join("posts.json")).unwrap()).unwrap();
        let slugs: Vec<&str> = index.iter().filter_map(|p| p["slug"].as_str()).collect();
        assert_eq!(slugs, vec!["second", "first"]);
        assert_eq!(index[0]["readingTime"], "1 min ");

        assert!(out.join("index.html").exists());
        assert!(out.join("assets/main.css").exists());
        assert!(out.join("assets/main.js").exists());
    }

    #[tokio::test]
    async fn skips_failing_posts() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        write_post(
            &posts,
            "good.mdx",
            "---\ntitle: Good\ndate: 2024-01-01\n---\nfine\n",
        );
        write_post(&posts, "bad.mdx", "---\ntitle: Bad\n---\nno date\n");

        let result = StaticBuilder::new(config(temp.path()))
            .unwrap()
            .build()
            .await
            .unwrap();

        assert_eq!(result.pages, 1);
        assert_eq!(result.failed, 1);
        assert!(!temp.path().join("dist/posts/bad").exists());
    }

    #[tokio::test]
    async fn fails_without_content_root() {
        let temp = tempdir().unwrap();

        let err = StaticBuilder::new(config(temp.path()))
            .unwrap()
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Posts(PostError::Io { .. })));
    }
}
