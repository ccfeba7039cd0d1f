//! Plain text notifications sent to the operators.
//!
//! Sending is fire-and-forget: failures are logged and never returned to the
//! caller of [`Notifier::notify`].

pub mod error;
pub mod telegram;
pub mod tracker;

use std::sync::Arc;

pub use error::NotifyError;
pub use telegram::TelegramNotifier;
pub use tracker::InitializationTracker;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Writes the notifications to the logs. Used when no chat is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        tracing::info!("[LogNotifier] 📣 {message}");
    }
}

/// Telegram when both credentials are set, the logs otherwise.
pub fn notifier_from_credentials(
    bot_token: Option<String>,
    chat_id: Option<String>,
) -> Arc<dyn Notifier> {
    match (bot_token, chat_id) {
        (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
            match TelegramNotifier::new(token, chat) {
                Ok(notifier) => return Arc::new(notifier),
                Err(e) => {
                    tracing::error!("[Notifier] 🔴 Cannot build Telegram client: {e}");
                }
            }
        }
        _ => {
            tracing::info!("[Notifier] Telegram credentials missing, notifications go to the logs");
        }
    }
    Arc::new(LogNotifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_fall_back_to_logs() {
        let notifier = notifier_from_credentials(None, Some("42".to_string()));
        notifier.notify("hello").await;

        let notifier = notifier_from_credentials(Some(String::new()), Some("42".to_string()));
        notifier.notify("hello").await;
    }
}
