use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use notibot_domain::{Event, ID};
use std::sync::Mutex;

pub struct InMemoryEventRepo {
    pub(crate) events: Mutex<Vec<Event>>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, event: &Event) -> anyhow::Result<()> {
        insert(event, &self.events);
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<Event> {
        find(event_id, &self.events)
    }

    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.events.lock().unwrap().len())
    }
}
