mod inmemory;
mod postgres;

pub use inmemory::InMemoryMessageLogRepo;
use notibot_domain::{MessageLog, ID};
pub use postgres::PostgresMessageLogRepo;

/// Audit trail of messages exchanged with the messaging platform
#[async_trait::async_trait]
pub trait IMessageLogRepo: Send + Sync {
    async fn record(&self, log: &MessageLog) -> anyhow::Result<()>;
    async fn find_by_user(&self, user_id: &ID) -> Vec<MessageLog>;
}
