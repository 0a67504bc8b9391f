mod fetcher;
mod models;

pub use fetcher::{build_client, RedditFetcher};
pub use models::{Feed, Icon, Item, ItemKind};

use async_trait::async_trait;

use crate::Result;

/// Where the relay reads posts and feed metadata from
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Current listing for `feed`, newest first. No retries.
    async fn fetch_items(&self, feed: &str) -> Result<Vec<Item>>;

    /// Icon shown next to notifications. Never fails; degrades to [`Icon::Missing`].
    async fn resolve_icon(&self, feed: &str) -> Icon;
}
