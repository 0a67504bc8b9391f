mod payload;
mod webhook;

pub use payload::{
    Embed, EmbedAuthor, EmbedFooter, EmbedImage, WebhookPayload, MAX_DESCRIPTION_CHARS,
    MAX_TITLE_CHARS,
};
pub use webhook::WebhookDispatcher;

use async_trait::async_trait;

use crate::Result;

/// Delivers one rendered notification to one endpoint
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Single attempt, no retry. Success is HTTP 200 or 204.
    async fn deliver(&self, endpoint: &str, payload: &WebhookPayload) -> Result<()>;
}
