//! Graph Send API client.
//!
//! One POST per reply to `/me/messages` with the page access token as a
//! query credential. No retry and no backoff: a failed send surfaces as an
//! error for the caller to log, and the message is gone.

use crate::send_api::{OutboundMessage, SendApi};
use anyhow::{Context, Result};
use async_trait::async_trait;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v2.6";

pub struct SendApiClient {
    client: reqwest::Client,
    base_url: String,
    page_access_token: String,
}

impl SendApiClient {
    pub fn new(page_access_token: String) -> Self {
        Self::with_base_url(GRAPH_API_BASE.to_string(), page_access_token)
    }

    /// Point the client at a different Graph API host (test servers).
    pub fn with_base_url(base_url: String, page_access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_access_token,
        }
    }
}

#[async_trait]
impl SendApi for SendApiClient {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let url = format!("{}/me/messages", self.base_url);
        let resp = self
            .client
            .post(&url)
            .query(&[("access_token", self.page_access_token.as_str())])
            .json(message)
            .send()
            .await
            .context("Send API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let detail = body
                .get("error")
                .and_then(|err| err.get("message"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Unknown API error");
            anyhow::bail!("Send API error {status}: {detail}");
        }

        tracing::debug!("Send API accepted message for {}", message.recipient.id);
        Ok(())
    }
}
