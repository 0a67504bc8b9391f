use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use feedhook_core::{
    feed::{build_client, Feed, RedditFetcher},
    notify::WebhookDispatcher,
    relay::RelayEngine,
    scheduler::SchedulerService,
    AppConfig,
};

/// Initialize every feed, then relay new posts until Ctrl+C or SIGTERM
pub async fn run(config: &AppConfig, feeds: Vec<Feed>) -> Result<()> {
    let client = build_client(&config.sync)?;
    let source = Arc::new(RedditFetcher::with_client(client.clone(), &config.source));
    let notifier = Arc::new(WebhookDispatcher::with_client(client, &config.source.user_agent));
    let engine = Arc::new(RelayEngine::new(
        source,
        notifier,
        config.source.permalink_base.clone(),
    ));

    info!("Initializing {} feeds", feeds.len());
    let registry = engine
        .initialize_all(feeds, config.startup.on_init_failure)
        .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    println!(
        "Relaying {} feeds every {} seconds. Press Ctrl+C to stop.",
        registry.len(),
        config.sync.poll_interval().as_secs()
    );

    // Blocks until shutdown
    SchedulerService::new(engine, &config.sync)
        .run(registry, shutdown_rx)
        .await;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
