// src/notify/mod.rs
//! Outbound delivery of digests. Every channel is optional; the mux fans a
//! message out to whichever ones are configured.

pub mod email;
pub mod slack;
pub mod telegram;

use anyhow::Result;

pub use email::EmailSender;
pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;

/// A rendered digest. `text` is the plain-text body produced by
/// [`crate::digest::format_list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub subject: String,
    pub text: String,
}

impl DigestMessage {
    pub fn new(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            text: text.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, msg: &DigestMessage) -> Result<()>;
    fn name(&self) -> &'static str;
}

#[derive(Default)]
pub struct NotifierMux {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Build from env; channels whose settings are missing are skipped.
    pub fn from_env() -> Self {
        let mut mux = Self::new();
        if let Some(tg) = TelegramNotifier::from_env() {
            mux = mux.with(Box::new(tg));
        }
        if let Some(slack) = SlackNotifier::from_env() {
            mux = mux.with(Box::new(slack));
        }
        match EmailSender::from_env() {
            Ok(Some(email)) => mux = mux.with(Box::new(email)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = ?e, "email notifier disabled"),
        }
        tracing::info!(channels = ?mux.channel_names(), "notifiers configured");
        mux
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Send to every channel. Failures are logged, not propagated; returns how
    /// many channels accepted the message.
    pub async fn notify(&self, msg: &DigestMessage) -> usize {
        let mut delivered = 0;
        for n in &self.notifiers {
            match n.send(msg).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(error = ?e, channel = n.name(), "notify failed"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording {
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for Recording {
        async fn send(&self, msg: &DigestMessage) -> Result<()> {
            if self.fail {
                anyhow::bail!("down");
            }
            self.seen.lock().unwrap().push(msg.subject.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_block_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mux = NotifierMux::new()
            .with(Box::new(Recording {
                seen: seen.clone(),
                fail: true,
            }))
            .with(Box::new(Recording {
                seen: seen.clone(),
                fail: false,
            }));
        let delivered = mux.notify(&DigestMessage::new("일일 추천", "body")).await;
        assert_eq!(delivered, 1);
        assert_eq!(seen.lock().unwrap().as_slice(), ["일일 추천".to_string()]);
    }
}
