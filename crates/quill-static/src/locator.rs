//! Source discovery under the content root.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use quill_mdx::{slug_from_path, SOURCE_EXTENSION};

use crate::index::PostError;

/// A post source and the slug it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub slug: String,

    /// Path relative to the content root
    pub path: PathBuf,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// All `.mdx` files under `root` at any depth, relative to `root` and sorted
/// by path. Hidden files and directories are skipped.
pub fn list_sources(root: &Path) -> Result<Vec<PathBuf>, PostError> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| PostError::Io {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source: io::Error::from(e),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_source = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(SOURCE_EXTENSION))
            .unwrap_or(false);
        if !is_source {
            continue;
        }

        paths.push(path.strip_prefix(root).unwrap_or(path).to_path_buf());
    }

    paths.sort();
    tracing::debug!(root = %root.display(), count = paths.len(), "located sources");
    Ok(paths)
}

/// Map sources to slugs. Two files with the same stem anywhere in the tree
/// are an error.
pub fn resolve_slugs(paths: Vec<PathBuf>) -> Result<Vec<Source>, PostError> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut sources = Vec::with_capacity(paths.len());

    for path in paths {
        let Some(slug) = slug_from_path(&path) else {
            continue;
        };

        if let Some(first) = seen.get(&slug) {
            return Err(PostError::DuplicateSlug {
                slug,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(slug.clone(), path.clone());
        sources.push(Source { slug, path });
    }

    Ok(sources)
}
