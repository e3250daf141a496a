//! Post listing command.

use std::path::Path;

use anyhow::Result;
use quill_static::StaticBuilder;

use crate::config::load_config;

/// Run the list command: print the published posts, newest first.
pub async fn run(config_path: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?.build_config(None, None);
    let builder = StaticBuilder::new(config)?;

    let posts = builder.index().list_posts().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    for post in &posts {
        println!(
            "{}  {:<24}  {} ({}read)",
            post.date,
            post.slug.as_deref().unwrap_or_default(),
            post.title,
            post.reading_time.as_deref().unwrap_or_default()
        );
    }

    tracing::info!("{} posts", posts.len());

    Ok(())
}
