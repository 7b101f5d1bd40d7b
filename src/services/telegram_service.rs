use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::telegram::{SendMessageRequest, TelegramMessage, TelegramResponse};
use async_trait::async_trait;
use reqwest::Client;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<TelegramMessage>;
}

#[derive(Clone)]
pub struct TelegramService {
    client: Client,
    api_url: String,
    bot_token: String,
}

impl TelegramService {
    pub fn new(config: &Config) -> Result<Self> {
        validate_bot_token(&config.telegram_token)?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            bot_token: config.telegram_token.clone(),
        })
    }

    /// Contains the bot token; request errors must drop it via `without_url`.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }
}

#[async_trait]
impl Messenger for TelegramService {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<TelegramMessage> {
        let body = SendMessageRequest { chat_id, text };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let parsed: TelegramResponse<TelegramMessage> = serde_json::from_str(&raw).map_err(|_| {
            Error::Delivery(format!("Telegram API responded {} with non-JSON body: {}", status, raw))
        })?;

        match parsed {
            TelegramResponse {
                ok: true,
                result: Some(message),
                ..
            } if status.is_success() => Ok(message),
            TelegramResponse {
                description,
                error_code,
                ..
            } => Err(Error::Delivery(format!(
                "Telegram API error {}: {}",
                error_code.unwrap_or(status.as_u16() as i64),
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

/// Bot tokens look like `<bot id>:<secret>`.
fn validate_bot_token(token: &str) -> Result<()> {
    let invalid = || Error::Config("Telegram bot token is malformed".to_string());
    if token.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (id, secret) = token.split_once(':').ok_or_else(invalid)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) || secret.is_empty() {
        return Err(invalid());
    }
    Ok(())
}
