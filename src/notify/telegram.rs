// src/notify/telegram.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{DigestMessage, Notifier};
use crate::config::env_opt;
use crate::digest::{chunk, MAX_MESSAGE_CHARS};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API `sendMessage` to a single chat. Long digests go out as several
/// messages of at most 4000 characters.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    /// `TELEGRAM_BOT_TOKEN` + `TELEGRAM_ALLOWED_CHAT_ID`, both required.
    pub fn from_env() -> Option<Self> {
        let token = env_opt("TELEGRAM_BOT_TOKEN")?;
        let Some(chat_id) = env_opt("TELEGRAM_ALLOWED_CHAT_ID") else {
            tracing::warn!("TELEGRAM_BOT_TOKEN set without TELEGRAM_ALLOWED_CHAT_ID; telegram disabled");
            return None;
        };
        Some(Self::new(token, chat_id))
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: true,
        };
        let url = self.endpoint();

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("telegram HTTP error: {e}"),
                },
                Err(e) => anyhow!("telegram request failed: {e}"),
            };
            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(attempt, error = %err, "telegram send retry");
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, msg: &DigestMessage) -> Result<()> {
        for part in chunk(&msg.text, MAX_MESSAGE_CHARS) {
            self.send_text(&part).await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_token() {
        let n = TelegramNotifier::new("123:abc".into(), "42".into())
            .with_api_base("http://localhost:9/");
        assert_eq!(n.endpoint(), "http://localhost:9/bot123:abc/sendMessage");
    }

    #[tokio::test]
    async fn unreachable_api_fails_after_retries() {
        let n = TelegramNotifier::new("t".into(), "1".into())
            .with_api_base("http://127.0.0.1:9")
            .with_timeout(1)
            .with_retries(1);
        assert!(n.send(&DigestMessage::new("s", "hello")).await.is_err());
    }
}
