//! Static site generator for quill blogs.
//!
//! Locates post sources, indexes them and builds the static site: an index
//! page, one page per post, the post index as JSON and the assets.

pub mod assets;
pub mod builder;
pub mod index;
pub mod locator;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use index::{adjacent, index_posts, Adjacent, PostError, PostIndex, SourceResult};
pub use locator::{list_sources, Source};
