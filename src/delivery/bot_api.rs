//! Telegram Bot API client for the `sendMessage` endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::TelegramConfig;

use super::DeliveryError;

const API_NAME: &str = "Telegram";

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Sends messages to one fixed chat
#[derive(Clone)]
pub struct BotApiClient {
    client: Client,
    /// Contains the bot token; never logged
    endpoint: String,
    chat_id: String,
    parse_mode: String,
}

impl BotApiClient {
    pub fn new(
        client: Client,
        api_base: &str,
        token: &str,
        chat_id: impl Into<String>,
        parse_mode: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            chat_id: chat_id.into(),
            parse_mode: parse_mode.into(),
        }
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, config::ConfigError> {
        let (Some(token), Some(chat_id)) = (&config.token, &config.chat_id) else {
            return Err(config::ConfigError::Message(
                "TELEGRAM_TOKEN and TELEGRAM_CHAT_ID are required".to_string(),
            ));
        };

        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder.build().map_err(|e| {
            config::ConfigError::Message(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self::new(
            client,
            &config.api_base,
            token,
            chat_id.as_str(),
            config.parse_mode.as_str(),
        ))
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send `text` to the configured chat and return the API's JSON response.
    ///
    /// Any non-success status is returned as [`DeliveryError::Rejected`] with
    /// the response body.
    pub async fn send_message(&self, text: &str) -> Result<serde_json::Value, DeliveryError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: &self.parse_mode,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                body = %body,
                "Telegram API returned error"
            );
            return Err(DeliveryError::Rejected {
                api: API_NAME,
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(transport)?;
        debug!(chat_id = %self.chat_id, "Telegram message sent");
        Ok(body)
    }
}

// reqwest includes the request URL, and with it the bot token, in its messages
fn transport(err: reqwest::Error) -> DeliveryError {
    DeliveryError::Transport {
        api: API_NAME,
        source: err.without_url(),
    }
}
