mod inmemory;
mod postgres;

pub use inmemory::InMemoryEventRepo;
use notibot_domain::{Event, ID};
pub use postgres::PostgresEventRepo;

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn insert(&self, event: &Event) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> Option<Event>;
    async fn count(&self) -> anyhow::Result<usize>;
}
