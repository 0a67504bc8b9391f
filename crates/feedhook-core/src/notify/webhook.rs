use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};

use super::{Notifier, WebhookPayload};
use crate::{Error, Result};

/// POSTs payloads to Discord-compatible webhook URLs
pub struct WebhookDispatcher {
    client: Client,
    user_agent: String,
}

impl WebhookDispatcher {
    pub fn with_client(client: Client, user_agent: &str) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookDispatcher {
    async fn deliver(&self, endpoint: &str, payload: &WebhookPayload) -> Result<()> {
        let response = self
            .client
            .post(endpoint)
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(payload)?)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Delivery {
            status: status.as_u16(),
            body,
        })
    }
}
