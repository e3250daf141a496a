//! Quill CLI - build and preview an MDX blog.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Build and preview an MDX blog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to quill.toml config file
    #[arg(short, long, default_value = "quill.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static blog
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// List published posts, newest first
    List {
        /// Print the post index as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview the built blog
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve
        #[arg(short, long, default_value = "dist")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build { output, no_minify } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&cli.config, output, minify).await?;
        }
        Commands::List { json } => {
            commands::list::run(&cli.config, json).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(port, dir).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_with_output() {
        let cli = Cli::try_parse_from(["quill", "build", "-o", "public"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("quill.toml"));
        match cli.command {
            Commands::Build { output, no_minify } => {
                assert_eq!(output, Some(PathBuf::from("public")));
                assert!(!no_minify);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn parses_list_json() {
        let cli = Cli::try_parse_from(["quill", "--config", "site.toml", "list", "--json"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["quill", "serve"]).unwrap();

        match cli.command {
            Commands::Serve { port, dir } => {
                assert_eq!(port, 4000);
                assert_eq!(dir, PathBuf::from("dist"));
            }
            _ => panic!("expected serve"),
        }
    }
}
