//! CLI entry point for spacetraveling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacetraveling::{commands, server, Blog};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog served from a Prismic repository", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Read CMS documents from a JSON dump instead of Prismic
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Export the blog as static files
    #[command(alias = "g")]
    Generate,

    /// List published posts
    List,

    /// Remove the exported files
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let fixtures = cli.fixtures.as_deref();

    match cli.command {
        Commands::Server { port, ip } => {
            let blog = Blog::new(&base_dir)?;
            let repo = blog.repository(fixtures)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&blog, repo, &ip, port).await?;
        }

        Commands::Generate => {
            let blog = Blog::new(&base_dir)?;
            let repo = blog.repository(fixtures)?;
            tracing::info!("Generating static files...");
            commands::generate::run(&blog, repo).await?;
            println!("Generated successfully!");
        }

        Commands::List => {
            let blog = Blog::new(&base_dir)?;
            let repo = blog.repository(fixtures)?;
            commands::list::run(&blog, repo).await?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            commands::clean::run(&blog)?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
