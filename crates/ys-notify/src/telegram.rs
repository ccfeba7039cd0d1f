use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Notifier;
use crate::error::NotifyError;

const TELEGRAM_API: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends notifications to a Telegram chat through the bot API.
pub struct TelegramNotifier {
    http_client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{TELEGRAM_API}/bot{}/sendMessage", self.bot_token)
    }

    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };
        let response = self
            .http_client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.json::<TelegramResponse>().await?;
        if !status.is_success() || !body.ok {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: body.description.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) {
        if let Err(e) = self.send(message).await {
            tracing::error!(chat_id = %self.chat_id, "[TelegramNotifier] 🔴 Failed to send message: {e}");
        }
    }
}
