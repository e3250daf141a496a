//! Preview server command.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::handler::HandlerWithoutStateExt;
use axum::http::StatusCode;
use axum::Router;
use tower_http::services::ServeDir;

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Router serving the built site. Directory requests resolve to their
/// `index.html`, so `/posts/{slug}/` serves the post page.
fn router(dir: &Path) -> Router {
    let site = ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .not_found_service(not_found.into_service());

    Router::new().fallback_service(site)
}

/// Run the serve command. Only pre-built output is served; nothing is
/// compiled on request.
pub async fn run(port: u16, dir: PathBuf) -> Result<()> {
    if !dir.join("index.html").exists() {
        anyhow::bail!(
            "No built site in {}. Run 'quill build' first.",
            dir.display()
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port)
        .parse()
        .context("Invalid address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    // Open browser
    let url = format!("http://{}", addr);
    if let Err(e) = open::that(&url) {
        tracing::debug!("Could not open browser: {}", e);
    }

    axum::serve(listener, router(&dir))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn refuses_unbuilt_directory() {
        let temp = tempdir().unwrap();

        let err = run(0, temp.path().to_path_buf()).await.unwrap_err();

        assert!(err.to_string().contains("quill build"));
    }
}
