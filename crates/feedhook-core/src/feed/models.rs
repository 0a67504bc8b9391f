use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A subreddit being relayed and the webhook its posts go to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub name: String,
    pub endpoint: String,
}

impl Feed {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// One post from a subreddit listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Body text; empty for link and image posts
    #[serde(default)]
    pub selftext: String,
    /// Site-relative path, e.g. `/r/rust/comments/abc/title/`
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub author: String,
    /// Epoch seconds. The listing sends a float.
    #[serde(default)]
    pub created_utc: f64,
    /// Only its presence matters
    #[serde(default)]
    pub preview: Option<serde_json::Value>,
    #[serde(default)]
    pub url_overridden_by_dest: Option<String>,
    /// Only its presence matters
    #[serde(default)]
    pub crosspost_parent_list: Option<serde_json::Value>,
}

/// How a post is presented in its notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Has a preview; the URL is attached as the embed image
    Image(String),
    /// A cross-post of another submission
    Link,
    Text,
}

impl ItemKind {
    /// Word inserted into "New <qualifier> post", if any
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            ItemKind::Image(_) => Some("image"),
            ItemKind::Link => Some("link"),
            ItemKind::Text => None,
        }
    }
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match (&self.preview, &self.url_overridden_by_dest) {
            (Some(_), Some(url)) if !url.is_empty() => ItemKind::Image(url.clone()),
            _ if self.crosspost_parent_list.is_some() => ItemKind::Link,
            _ => ItemKind::Text,
        }
    }

    /// Creation time as RFC 3339 UTC, e.g. `2023-11-14T22:13:20Z`
    pub fn timestamp(&self) -> String {
        let created = DateTime::<Utc>::from_timestamp(self.created_utc as i64, 0)
            .unwrap_or_default();
        created.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Best-effort icon for a feed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Icon {
    Url(String),
    #[default]
    Missing,
}

impl Icon {
    /// Build an icon from a raw `community_icon` value, cutting any query after `.png`
    pub fn from_community_icon(raw: &str) -> Self {
        let url = match raw.find(".png") {
            Some(idx) => &raw[..idx + ".png".len()],
            None => raw,
        };

        if url.is_empty() {
            Icon::Missing
        } else {
            Icon::Url(url.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Icon::Url(url) => url,
            Icon::Missing => "",
        }
    }
}

/// `{ data: { children: [ { data: Item } ] } }`
#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    pub children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingChild {
    pub data: Item,
}

impl Listing {
    pub fn into_items(self) -> Vec<Item> {
        self.data.children.into_iter().map(|c| c.data).collect()
    }
}

/// `{ data: { community_icon } }`
#[derive(Debug, Deserialize)]
pub(crate) struct About {
    pub data: AboutData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AboutData {
    pub community_icon: String,
}
