//! Configuration file structure (quill.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quill_mdx::{HighlightThemes, PipelineConfig, DEFAULT_ADMONITION_KINDS};
use quill_static::BuildConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub site: SiteConfig,
    pub posts: PostsConfig,
    pub build: BuildSettings,
    pub highlight: HighlightConfig,
    pub toc: TocConfig,
    pub admonitions: AdmonitionsConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            base_url: "/".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostsConfig {
    pub dir: PathBuf,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("posts"),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    pub output: PathBuf,
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
            minify: true,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct HighlightConfig {
    pub dark: String,
    pub light: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        let themes = HighlightThemes::default();
        Self {
            dark: themes.dark,
            light: themes.light,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TocConfig {
    pub levels: Vec<u8>,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            levels: vec![2, 3, 4],
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdmonitionsConfig {
    pub kinds: Vec<String>,
}

impl Default for AdmonitionsConfig {
    fn default() -> Self {
        Self {
            kinds: DEFAULT_ADMONITION_KINDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

impl ConfigFile {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            themes: HighlightThemes {
                dark: self.highlight.dark.clone(),
                light: self.highlight.light.clone(),
            },
            toc_levels: self.toc.levels.clone(),
            admonition_kinds: self.admonitions.kinds.clone(),
            ..PipelineConfig::default()
        }
    }

    /// Build settings, with command-line overrides applied.
    pub fn build_config(&self, output: Option<PathBuf>, minify: Option<bool>) -> BuildConfig {
        BuildConfig {
            posts_dir: self.posts.dir.clone(),
            output_dir: output.unwrap_or_else(|| self.build.output.clone()),
            minify: minify.unwrap_or(self.build.minify),
            base_url: self.site.base_url.clone(),
            title: self.site.title.clone(),
            pipeline: self.pipeline_config(),
        }
    }
}
