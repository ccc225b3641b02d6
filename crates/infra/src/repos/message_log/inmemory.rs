use super::IMessageLogRepo;
use crate::repos::shared::inmemory_repo::*;
use notibot_domain::{MessageLog, ID};
use std::sync::Mutex;

pub struct InMemoryMessageLogRepo {
    logs: Mutex<Vec<MessageLog>>,
}

impl InMemoryMessageLogRepo {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IMessageLogRepo for InMemoryMessageLogRepo {
    async fn record(&self, log: &MessageLog) -> anyhow::Result<()> {
        insert(log, &self.logs);
        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<MessageLog> {
        find_by(&self.logs, |l| l.user_id.as_ref() == Some(user_id))
    }
}
