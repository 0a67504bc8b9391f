use anyhow::Result;

use feedhook_core::{
    feed::{build_client, FeedSource, RedditFetcher},
    relay::{self, diff},
    AppConfig,
};

/// Print the payloads the relay would send for the newest `limit` posts, without sending
pub async fn run(config: &AppConfig, feed: &str, limit: usize) -> Result<()> {
    let client = build_client(&config.sync)?;
    let source = RedditFetcher::with_client(client, &config.source);

    let items = source.fetch_items(feed).await?;
    if items.is_empty() {
        println!("r/{} has no posts.", feed);
        return Ok(());
    }

    let payloads = relay::render(
        &source,
        feed,
        diff::oldest_first(&items, limit),
        &config.source.permalink_base,
    )
    .await;
    for payload in &payloads {
        println!("{}", serde_json::to_string_pretty(payload)?);
    }

    eprintln!("\n{} of {} posts rendered, oldest first.", payloads.len(), items.len());

    Ok(())
}
