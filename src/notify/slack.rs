// src/notify/slack.rs
use anyhow::{Context, Result};
use reqwest::Client;

use super::{DigestMessage, Notifier};
use crate::config::env_opt;

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn from_env() -> Option<Self> {
        env_opt("SLACK_WEBHOOK_URL").map(Self::new)
    }

    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, msg: &DigestMessage) -> Result<()> {
        let text = format!("*{}*\n{}", msg.subject, msg.text);
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
