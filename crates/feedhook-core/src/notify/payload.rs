use serde::{Deserialize, Serialize};

use crate::feed::{Icon, Item, ItemKind};

/// Discord rejects embeds over these limits (counted in characters)
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

const ELLIPSIS: &str = "...";

/// Body of one webhook call: no content, one embed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub content: Option<String>,
    pub attachments: Vec<serde_json::Value>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: Option<u32>,
    pub footer: EmbedFooter,
    pub timestamp: String,
    pub author: EmbedAuthor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

impl WebhookPayload {
    /// Render the notification for a new post in `feed`
    pub fn for_item(feed: &str, item: &Item, icon: &Icon, permalink_base: &str) -> Self {
        let kind = item.kind();
        let link = format!("{}{}", permalink_base.trim_end_matches('/'), item.permalink);

        let author_line = match kind.qualifier() {
            Some(qualifier) => format!("New {} post in r/{}", qualifier, feed),
            None => format!("New post in r/{}", feed),
        };

        let image = match kind {
            ItemKind::Image(url) => Some(EmbedImage { url }),
            _ => None,
        };

        let embed = Embed {
            title: truncate_chars(&item.title, MAX_TITLE_CHARS),
            description: truncate_chars(&item.selftext, MAX_DESCRIPTION_CHARS),
            url: link.clone(),
            color: None,
            footer: EmbedFooter {
                text: format!("u/{}", item.author),
            },
            timestamp: item.timestamp(),
            author: EmbedAuthor {
                name: author_line,
                url: link,
                icon_url: icon.as_str().to_string(),
            },
            image,
        };

        Self {
            content: None,
            attachments: Vec::new(),
            embeds: vec![embed],
        }
    }
}

/// Cut `text` to at most `max_chars` characters, ending in "..." when shortened
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
