mod max_platform;
mod mock;

pub use max_platform::MaxPlatformMessenger;
pub use mock::MockMessenger;
use notibot_domain::ReminderMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Receipt of a message accepted by the messaging platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentMessage {
    pub status: u16,
    pub id: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SendError {
    #[error("Rate limit exceeded when calling MAX API.")]
    RateLimited,
    #[error("Authentication with MAX API failed. Verify MAX_BOT_TOKEN.")]
    Unauthenticated,
    #[error("MAX API temporarily unavailable.")]
    Unavailable,
    #[error("Unexpected MAX API error. Status: {0}")]
    Unknown(u16),
    #[error("MAX_BOT_TOKEN must be set when USE_MOCK_MAX_API=false")]
    MissingCredentials,
    #[error("Sending the message timed out after {0:?}")]
    Timeout(Duration),
    #[error("MAX API request failed: {0}")]
    Network(String),
}

impl SendError {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthenticated,
            429 => Self::RateLimited,
            503 => Self::Unavailable,
            status => Self::Unknown(status),
        }
    }

    /// Status code stored in the audit trail for a failed send
    pub fn status_code(&self) -> i32 {
        match self {
            Self::RateLimited => 429,
            Self::Unauthenticated => 401,
            Self::Unavailable => 503,
            Self::Unknown(status) => i32::from(*status),
            Self::Timeout(_) => 504,
            Self::MissingCredentials | Self::Network(_) => 500,
        }
    }

    /// Transient failures are expected to go away by themselves, the rest
    /// need an operator to fix the configuration.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Unavailable | Self::Timeout(_) | Self::Network(_)
        )
    }
}

/// Outbound side of the messaging platform
#[async_trait::async_trait]
pub trait IMessenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: &str,
        message: &ReminderMessage,
    ) -> Result<SentMessage, SendError>;
}
