use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy, StatusCode};

use super::models::{About, Icon, Item, Listing};
use super::FeedSource;
use crate::config::{SourceConfig, SyncConfig};
use crate::{Error, Result};

/// Build the HTTP client shared by fetching and delivery, with optional proxy
pub fn build_client(sync: &SyncConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(sync.request_timeout_secs))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(ref proxy) = sync.proxy_url {
        let proxy =
            Proxy::all(proxy).map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
        tracing::info!("Using HTTP proxy for outbound requests");
    }

    builder.build().map_err(Error::Http)
}

/// Reads subreddit listings and metadata over HTTP
pub struct RedditFetcher {
    client: Client,
    base_url: String,
    user_agent: String,
    listing_limit: Option<u32>,
}

impl RedditFetcher {
    /// Create a fetcher on top of an existing client
    pub fn with_client(client: Client, source: &SourceConfig) -> Self {
        Self {
            client,
            base_url: source.base_url.trim_end_matches('/').to_string(),
            user_agent: source.user_agent.clone(),
            listing_limit: source.listing_limit,
        }
    }

    fn listing_url(&self, feed: &str) -> String {
        format!("{}/r/{}/new.json", self.base_url, feed)
    }

    fn about_url(&self, feed: &str) -> String {
        format!("{}/r/{}/about.json", self.base_url, feed)
    }

    /// GET `url` for `feed` and return the body, treating anything but 200 as a failure
    async fn get_ok(&self, feed: &str, url: &str, query: &[(&str, String)]) -> Result<String> {
        let fetch_error = |reason: String| Error::Fetch {
            feed: feed.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(fetch_error(format!("HTTP {} for URL: {}", status, url)));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }
}

#[async_trait]
impl FeedSource for RedditFetcher {
    async fn fetch_items(&self, feed: &str) -> Result<Vec<Item>> {
        let url = self.listing_url(feed);
        let query: Vec<(&str, String)> = self
            .listing_limit
            .map(|limit| vec![("limit", limit.to_string())])
            .unwrap_or_default();

        tracing::debug!("Fetching listing from: {}", url);

        let body = self.get_ok(feed, &url, &query).await?;
        let listing: Listing = serde_json::from_str(&body).map_err(|e| Error::Fetch {
            feed: feed.to_string(),
            reason: format!("malformed listing: {}", e),
        })?;

        Ok(listing.into_items())
    }

    async fn resolve_icon(&self, feed: &str) -> Icon {
        let url = self.about_url(feed);

        let body = match self.get_ok(feed, &url, &[]).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Icon lookup for r/{} failed: {}", feed, e);
                return Icon::Missing;
            }
        };

        match serde_json::from_str::<About>(&body) {
            Ok(about) => Icon::from_community_icon(&about.data.community_icon),
            Err(e) => {
                tracing::debug!("Icon lookup for r/{} returned malformed data: {}", feed, e);
                Icon::Missing
            }
        }
    }
}
