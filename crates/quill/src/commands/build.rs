//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use quill_static::StaticBuilder;

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let file_config = load_config(config_path)?;
    let config = file_config.build_config(output, minify);

    let result = StaticBuilder::new(config)?.build().await?;

    if result.failed > 0 {
        tracing::warn!("{} posts failed to compile", result.failed);
    }

    tracing::info!(
        "Built {} pages ({} listed) in {}ms",
        result.pages,
        result.listed,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
