//! The delivery seam and its dry-run and configured implementations.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use dropwatch_core::{AppConfig, NotifierKind};
use serde::Serialize;

use crate::error::NotifyError;
use crate::x_client::XClient;

/// Identifier of a delivered message (the post id for X).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivers one already-formatted message.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> impl Future<Output = Result<MessageId, NotifyError>> + Send;
}

/// Logs messages instead of sending them. Ids are `dry-run-1`, `dry-run-2`, ...
#[derive(Debug, Default)]
pub struct LogNotifier {
    sent: AtomicU64,
}

impl LogNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "delivered" so far.
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<MessageId, NotifyError> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(message, "notification (log only)");
        Ok(MessageId(format!("dry-run-{n}")))
    }
}

/// The notifier chosen by `DROPWATCH_NOTIFIER`.
pub enum ConfiguredNotifier {
    Log(LogNotifier),
    X(XClient),
}

impl ConfiguredNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] when the X notifier is selected without
    /// an access token, or the X client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, NotifyError> {
        match config.notifier {
            NotifierKind::Log => Ok(Self::Log(LogNotifier::new())),
            NotifierKind::X => {
                let token = config
                    .x_access_token
                    .as_deref()
                    .ok_or_else(|| NotifyError::Config("X access token is not set".to_owned()))?;
                let client = XClient::with_base_url(
                    token,
                    config.scraper_request_timeout_secs,
                    config.notify_max_retries,
                    &config.x_api_base_url,
                )?;
                Ok(Self::X(client))
            }
        }
    }

    /// The dry-run notifier, regardless of configuration.
    #[must_use]
    pub fn log_only() -> Self {
        Self::Log(LogNotifier::new())
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::X(_) => "x",
        }
    }
}

impl Notifier for ConfiguredNotifier {
    async fn notify(&self, message: &str) -> Result<MessageId, NotifyError> {
        match self {
            Self::Log(n) => n.notify(message).await,
            Self::X(n) => n.notify(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_numbers_messages() {
        let notifier = LogNotifier::new();
        assert_eq!(notifier.notify("a").await.unwrap(), MessageId("dry-run-1".to_owned()));
        assert_eq!(notifier.notify("b").await.unwrap().to_string(), "dry-run-2");
        assert_eq!(notifier.sent(), 2);
    }

    #[tokio::test]
    async fn log_only_never_touches_the_network() {
        let notifier = ConfiguredNotifier::log_only();
        assert_eq!(notifier.kind_name(), "log");
        assert!(notifier.notify("hello").await.is_ok());
    }
}
