use super::{IMessenger, SendError, SentMessage};
use crate::config::MessengerConfig;
use notibot_domain::ReminderMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    payload: &'a ReminderMessage,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

/// Client of the MAX bot platform REST API
pub struct MaxPlatformMessenger {
    client: Client,
    base_url: String,
    bot_token: Option<String>,
    timeout: Duration,
}

impl MaxPlatformMessenger {
    pub fn new(config: &MessengerConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait::async_trait]
impl IMessenger for MaxPlatformMessenger {
    async fn send_message(
        &self,
        chat_id: &str,
        message: &ReminderMessage,
    ) -> Result<SentMessage, SendError> {
        let bot_token = match &self.bot_token {
            Some(token) => token,
            None => {
                error!("[Configuration Error] MAX API credentials are missing");
                return Err(SendError::MissingCredentials);
            }
        };

        let res = match self
            .client
            .post(&format!("{}/messages", self.base_url))
            .header("authorization", format!("Bearer {}", bot_token))
            .json(&SendMessageRequest {
                chat_id,
                payload: message,
            })
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                error!(
                    "[Network Error] MAX API POST messages error. Error message: {:?}",
                    e
                );
                if e.is_timeout() {
                    return Err(SendError::Timeout(self.timeout));
                }
                return Err(SendError::Network(e.to_string()));
            }
        };

        let status = res.status();
        if !status.is_success() {
            let e = SendError::from_status(status.as_u16());
            let body = res.text().await.unwrap_or_default();
            error!(
                "[Unexpected Response] MAX API responded with status {}: {}. Body: {}",
                status, e, body
            );
            return Err(e);
        }

        let id = match res.json::<SendMessageResponse>().await {
            Ok(body) => body.id.or(body.message_id).unwrap_or_default(),
            Err(e) => {
                error!(
                    "[Unexpected Response] MAX API messages response could not be decoded. Error message: {:?}",
                    e
                );
                String::new()
            }
        };

        Ok(SentMessage {
            status: status.as_u16(),
            id,
        })
    }
}
