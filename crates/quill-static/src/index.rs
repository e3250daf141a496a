//! The post index: compiles every source and answers list, fetch and
//! adjacency queries.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use quill_mdx::{
    compile_post, CompileError, CompiledPost, DocumentError, Frontmatter, FrontmatterError,
    Pipeline,
};

use crate::locator::{list_sources, resolve_slugs, Source};

/// Errors raised by the post index.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("No post with slug `{slug}`")]
    NotFound { slug: String },

    #[error("Invalid frontmatter in `{slug}`: {source}")]
    Parse {
        slug: String,
        #[source]
        source: FrontmatterError,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Slug `{slug}` is used by both {} and {}", first.display(), second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Compile task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<DocumentError> for PostError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Parse { slug, source } => PostError::Parse { slug, source },
            DocumentError::Compile(e) => PostError::Compile(e),
        }
    }
}

impl PostError {
    /// Stage that failed, for per-document errors.
    pub fn stage(&self) -> &str {
        match self {
            PostError::Parse { .. } => "frontmatter",
            PostError::Compile(e) => &e.stage,
            PostError::Io { .. } => "read",
            PostError::NotFound { .. } | PostError::DuplicateSlug { .. } | PostError::Join(_) => {
                "index"
            }
        }
    }
}

/// Neighbours of a post in the listed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Adjacent {
    /// The next newer post
    pub prev: Option<Frontmatter>,

    /// The next older post
    pub next: Option<Frontmatter>,
}

/// Outcome of compiling one source.
#[derive(Debug)]
pub struct SourceResult {
    pub slug: String,
    pub result: Result<CompiledPost, PostError>,
}

/// Posts under one content root, compiled with a shared pipeline.
#[derive(Debug, Clone)]
pub struct PostIndex {
    root: PathBuf,
    pipeline: Arc<Pipeline>,
}

impl PostIndex {
    pub fn new(root: impl Into<PathBuf>, pipeline: Pipeline) -> Self {
        Self {
            root: root.into(),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every source with its slug, in path order.
    pub fn sources(&self) -> Result<Vec<Source>, PostError> {
        resolve_slugs(list_sources(&self.root)?)
    }

    /// Compile every source concurrently. The outer error is fatal for the
    /// whole index; per-document failures are reported in place, in source
    /// order.
    pub async fn compile_all(&self) -> Result<Vec<SourceResult>, PostError> {
        let sources = self.sources()?;
        let mut slots: Vec<Option<SourceResult>> = Vec::with_capacity(sources.len());
        slots.resize_with(sources.len(), || None);

        let mut tasks = JoinSet::new();
        for (i, source) in sources.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let path = self.root.join(&source.path);
            tasks.spawn(async move {
                let result = compile_source(&pipeline, &source.slug, &path).await;
                (
                    i,
                    SourceResult {
                        slug: source.slug,
                        result,
                    },
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (i, result) = joined?;
            slots[i] = Some(result);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Frontmatter of every published post, newest first.
    ///
    /// All sources are compiled before any failure is reported; the first
    /// failure in source order wins.
    pub async fn list_posts(&self) -> Result<Vec<Frontmatter>, PostError> {
        let mut posts = Vec::new();
        for compiled in self.compile_all().await? {
            posts.push(compiled.result?.frontmatter);
        }
        Ok(index_posts(posts))
    }

    /// Compile the post published under `slug`. Drafts are retrievable.
    pub async fn get_post(&self, slug: &str) -> Result<CompiledPost, PostError> {
        let source = self
            .sources()?
            .into_iter()
            .find(|s| s.slug == slug)
            .ok_or_else(|| PostError::NotFound {
                slug: slug.to_string(),
            })?;

        compile_source(&self.pipeline, &source.slug, &self.root.join(&source.path)).await
    }

    /// The newer and older neighbours of `slug` among listed posts.
    pub async fn get_adjacent(&self, slug: &str) -> Result<Adjacent, PostError> {
        let posts = self.list_posts().await?;
        Ok(adjacent(&posts, slug))
    }
}

async fn compile_source(
    pipeline: &Pipeline,
    slug: &str,
    path: &Path,
) -> Result<CompiledPost, PostError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PostError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(compile_post(pipeline, slug, &source)?)
}

/// Drop drafts and order by date, newest first. Posts with equal dates keep
/// their input order.
pub fn index_posts(posts: Vec<Frontmatter>) -> Vec<Frontmatter> {
    let mut listed: Vec<Frontmatter> = posts.into_iter().filter(|p| !p.draft).collect();
    listed.sort_by(|a, b| b.date.instant().cmp(&a.date.instant()));
    listed
}

/// Neighbours of `slug` in an already indexed list. Unknown slugs have none.
pub fn adjacent(posts: &[Frontmatter], slug: &str) -> Adjacent {
    let Some(i) = posts
        .iter()
        .position(|p| p.slug.as_deref() == Some(slug))
    else {
        return Adjacent::default();
    };

    Adjacent {
        prev: i.checked_sub(1).and_then(|j| posts.get(j)).cloned(),
        next: posts.get(i + 1).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn post(title: &str, date: &str, extra: &str) -> String {
        format!("---\ntitle: {title}\ndate: {date}\n{extra}---\nBody of {title}.\n")
    }

    fn index(files: &[(&str, String)]) -> (TempDir, PostIndex) {
        let temp = tempdir().unwrap();
        for (rel, content) in files {
            write(temp.path(), rel, content);
        }
        let pipeline = Pipeline::builder().build().unwrap();
        let index = PostIndex::new(temp.path(), pipeline);
        (temp, index)
    }

    fn slugs(posts: &[Frontmatter]) -> Vec<&str> {
        posts.iter().filter_map(|p| p.slug.as_deref()).collect()
    }

    #[tokio::test]
    async fn lists_posts_newest_first() {
        let (_temp, index) = index(&[
            ("a.mdx", post("A", "2024-01-01", "")),
            ("b.mdx", post("B", "2024-06-01", "")),
        ]);

        let posts = index.list_posts().await.unwrap();

        assert_eq!(slugs(&posts), vec!["b", "a"]);
        assert_eq!(posts[0].title, "B");

        let newest = index.get_adjacent("b").await.unwrap();
        assert!(newest.prev.is_none());
        assert_eq!(newest.next.unwrap().title, "A");

        let oldest = index.get_adjacent("a").await.unwrap();
        assert_eq!(oldest.prev.unwrap().title, "B");
        assert!(oldest.next.is_none());
    }

    #[tokio::test]
    async fn skips_drafts_between_neighbours() {
        let (_temp, index) = index(&[
            ("x.mdx", post("X", "2024-01-01", "")),
            ("y.mdx", post("Y", "2024-01-02", "draft: true\n")),
            ("z.mdx", post("Z", "2024-01-03", "")),
        ]);

        let posts = index.list_posts().await.unwrap();
        assert_eq!(slugs(&posts), vec!["z", "x"]);

        let adj = index.get_adjacent("x").await.unwrap();
        assert_eq!(adj.prev.unwrap().title, "Z");
        assert!(adj.next.is_none());

        assert!(index.get_post("y").await.is_ok());
    }

    #[tokio::test]
    async fn single_post_has_no_neighbours() {
        let (_temp, index) = index(&[("only.mdx", post("Only", "2024-01-01", ""))]);

        assert_eq!(
            index.get_adjacent("only").await.unwrap(),
            Adjacent::default()
        );
    }

    #[tokio::test]
    async fn hides_drafts_but_serves_them() {
        let (_temp, index) = index(&[
            ("x.mdx", post("X", "2024-03-01", "draft: true\n")),
            ("y.mdx", post("Y", "2024-01-01", "")),
        ]);

        let posts = index.list_posts().await.unwrap();
        assert_eq!(slugs(&posts), vec!["y"]);

        let draft = index.get_post("x").await.unwrap();
        assert!(draft.frontmatter.draft);
        assert_eq!(draft.content, "<p>Body of X.</p>");

        let adj = index.get_adjacent("x").await.unwrap();
        assert_eq!(adj, Adjacent::default());
    }

    #[tokio::test]
    async fn every_listed_slug_is_retrievable() {
        let (_temp, index) = index(&[
            ("2023/old.mdx", post("Old", "2023-06-01", "")),
            ("new.mdx", post("New", "2024-06-01T10:00:00Z", "")),
            ("mid.mdx", post("Mid", "2024-01-15", "")),
        ]);

        let posts = index.list_posts().await.unwrap();
        assert_eq!(slugs(&posts), vec!["new", "mid", "old"]);

        for listed in &posts {
            let slug = listed.slug.as_deref().unwrap();
            let post = index.get_post(slug).await.unwrap();
            assert_eq!(&post.frontmatter, listed);

            let adj = index.get_adjacent(slug).await.unwrap();
            if let Some(prev) = adj.prev {
                assert!(prev.date.instant() >= listed.date.instant());
            }
            if let Some(next) = adj.next {
                assert!(next.date.instant() <= listed.date.instant());
            }
        }
    }

    #[tokio::test]
    async fn reports_unknown_slug() {
        let (_temp, index) = index(&[("a.mdx", post("A", "2024-01-01", ""))]);

        let err = index.get_post("missing").await.unwrap_err();

        assert!(matches!(err, PostError::NotFound { slug } if slug == "missing"));
    }

    #[tokio::test]
    async fn returns_first_failure_in_source_order() {
        let (_temp, index) = index(&[
            ("a.mdx", post("A", "2024-01-01", "")),
            ("b.mdx", "---\ntitle: B\n---\nno date\n".to_string()),
            ("c.mdx", post("C", "2024-01-01", "").replace("Body", ":::note\nBody")),
        ]);

        let results = index.compile_all().await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].result.is_ok());
        assert_eq!(results[1].result.as_ref().unwrap_err().stage(), "frontmatter");
        assert_eq!(results[2].result.as_ref().unwrap_err().stage(), "directive");

        let err = index.list_posts().await.unwrap_err();
        assert!(matches!(err, PostError::Parse { slug, .. } if slug == "b"));
    }

    #[tokio::test]
    async fn rejects_duplicate_slugs() {
        let (_temp, index) = index(&[
            ("2023/hello.mdx", post("One", "2023-01-01", "")),
            ("2024/hello.mdx", post("Two", "2024-01-01", "")),
        ]);

        assert!(matches!(
            index.list_posts().await,
            Err(PostError::DuplicateSlug { .. })
        ));
    }

    #[test]
    fn sorts_stably_and_finds_neighbours() {
        let fm = |slug: &str, date: &str| -> Frontmatter {
            let yaml = format!("title: {slug}\ndate: {date}\nslug: {slug}\n");
            serde_yaml::from_str(&yaml).unwrap()
        };

        let posts = index_posts(vec![
            fm("a", "2024-01-01"),
            fm("b", "2024-05-01"),
            fm("c", "2024-01-01"),
        ]);
        assert_eq!(slugs(&posts), vec!["b", "a", "c"]);

        let adj = adjacent(&posts, "a");
        assert_eq!(adj.prev.unwrap().slug.as_deref(), Some("b"));
        assert_eq!(adj.next.unwrap().slug.as_deref(), Some("c"));

        let first = adjacent(&posts, "b");
        assert!(first.prev.is_none());
        assert_eq!(adjacent(&posts, "zzz"), Adjacent::default());
        assert_eq!(adjacent(&[], "a"), Adjacent::default());
    }
}
