mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
pub use inmemory::InMemorySubscriptionRepo;
use notibot_domain::{ReminderCandidate, Subscription, ID};
pub use postgres::PostgresSubscriptionRepo;

#[async_trait::async_trait]
pub trait ISubscriptionRepo: Send + Sync {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn find_by_user_and_event(&self, user_id: &ID, event_id: &ID) -> Option<Subscription>;
    /// All accepted `Subscription`s joined with their `Event` and `User`
    async fn find_reminder_candidates(&self) -> anyhow::Result<Vec<ReminderCandidate>>;
    /// The accepted `Subscription` of the user whose `Event` starts first
    /// at or after `after`
    async fn find_next_candidate_for_user(
        &self,
        user_id: &ID,
        after: DateTime<Utc>,
    ) -> anyhow::Result<Option<ReminderCandidate>>;
    /// Atomically stores the dedup marker of a delivered reminder.
    ///
    /// Fails when the subscription does not exist or `tier_minutes` is not
    /// strictly finer than the tier already recorded.
    async fn commit_reminder(
        &self,
        subscription_id: &ID,
        sent_at: DateTime<Utc>,
        tier_minutes: u32,
    ) -> anyhow::Result<()>;
}
