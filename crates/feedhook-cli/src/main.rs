use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedhook_core::{load_feed_list, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "feedhook")]
#[command(author, version, about = "Relay new subreddit posts to Discord webhooks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ~/.config/feedhook/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Feed list JSON mapping subreddit to webhook URL (overrides general.feed_list)
    #[arg(short = 'f', long, global = true)]
    feeds: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch every feed and relay new posts (default)
    Run,
    /// List configured feeds
    List,
    /// Print the notifications for a feed's newest posts without sending them
    Preview {
        /// Subreddit name, without the r/ prefix
        feed: String,
        /// Number of posts to render
        #[arg(short = 'n', long, default_value_t = 1)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let feed_list = cli.feeds.unwrap_or_else(|| config.feed_list_path());

    match cli.command {
        Some(Commands::Run) | None => {
            let feeds = load_feed_list(&feed_list)?;
            commands::run::run(&config, feeds).await
        }
        Some(Commands::List) => {
            let feeds = load_feed_list(&feed_list)?;
            commands::list::run(&feeds)
        }
        Some(Commands::Preview { feed, limit }) => {
            commands::preview::run(&config, &feed, limit).await
        }
    }
}
