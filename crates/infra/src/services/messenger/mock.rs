use super::{IMessenger, SendError, SentMessage};
use notibot_domain::ReminderMessage;
use std::sync::Mutex;
use tracing::debug;

/// Delivers messages to memory instead of the MAX platform
pub struct MockMessenger {
    messages: Mutex<Vec<(String, ReminderMessage)>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(vec![]),
        }
    }

    /// Every `(chat_id, message)` sent so far
    pub fn sent(&self) -> Vec<(String, ReminderMessage)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IMessenger for MockMessenger {
    async fn send_message(
        &self,
        chat_id: &str,
        message: &ReminderMessage,
    ) -> Result<SentMessage, SendError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push((chat_id.to_string(), message.clone()));
        let id = format!("mock-{}", messages.len());
        debug!("Mock MAX message {} sent to chat {}", id, chat_id);

        Ok(SentMessage { status: 200, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn records_sent_messages() {
        let messenger = MockMessenger::new();
        let message = ReminderMessage::build("en", "Lab", Utc::now(), None, 5, chrono_tz::UTC);

        let receipt = messenger.send_message("chat-1", &message).await.unwrap();
        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.id, "mock-1");
        assert_eq!(messenger.sent(), vec![("chat-1".to_string(), message)]);
    }
}
