use super::ISubscriptionRepo;
use crate::repos::{
    event::InMemoryEventRepo, shared::inmemory_repo::*, user::InMemoryUserRepo,
};
use chrono::{DateTime, Utc};
use notibot_domain::{ReminderCandidate, Subscription, ID};
use std::sync::{Arc, Mutex};

/// Joins against the in memory `User` and `Event` repos to mimic the
/// relational snapshot query.
pub struct InMemorySubscriptionRepo {
    subscriptions: Mutex<Vec<Subscription>>,
    users: Arc<InMemoryUserRepo>,
    events: Arc<InMemoryEventRepo>,
}

impl InMemorySubscriptionRepo {
    pub fn new(users: Arc<InMemoryUserRepo>, events: Arc<InMemoryEventRepo>) -> Self {
        Self {
            subscriptions: Mutex::new(vec![]),
            users,
            events,
        }
    }

    fn accepted_candidates<F: Fn(&Subscription) -> bool>(
        &self,
        filter: F,
    ) -> Vec<ReminderCandidate> {
        let accepted = find_by(&self.subscriptions, |s| s.is_accepted() && filter(s));

        accepted
            .into_iter()
            .filter_map(|subscription| {
                let user = find(&subscription.user_id, &self.users.users)?;
                let event = find(&subscription.event_id, &self.events.events)?;
                Some(ReminderCandidate {
                    subscription_id: subscription.id,
                    user_id: user.id,
                    event_id: event.id,
                    chat_id: user.chat_id,
                    locale: subscription.locale,
                    event_start_time: event.start_time,
                    event_title: event.title,
                    event_location: event.location,
                    last_reminder_at: subscription.last_reminder_at,
                    last_reminder_offset_minutes: subscription.last_reminder_offset_minutes,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        insert(subscription, &self.subscriptions);
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        save(subscription, &self.subscriptions);
        Ok(())
    }

    async fn find_by_user_and_event(&self, user_id: &ID, event_id: &ID) -> Option<Subscription> {
        find_by(&self.subscriptions, |s| {
            s.user_id == *user_id && s.event_id == *event_id
        })
        .into_iter()
        .next()
    }

    async fn find_reminder_candidates(&self) -> anyhow::Result<Vec<ReminderCandidate>> {
        Ok(self.accepted_candidates(|_| true))
    }

    async fn find_next_candidate_for_user(
        &self,
        user_id: &ID,
        after: DateTime<Utc>,
    ) -> anyhow::Result<Option<ReminderCandidate>> {
        Ok(self
            .accepted_candidates(|s| s.user_id == *user_id)
            .into_iter()
            .filter(|c| matches!(c.event_start_time, Some(start) if start >= after))
            .min_by_key(|c| c.event_start_time))
    }

    async fn commit_reminder(
        &self,
        subscription_id: &ID,
        sent_at: DateTime<Utc>,
        tier_minutes: u32,
    ) -> anyhow::Result<()> {
        match update_one(subscription_id, &self.subscriptions, |s| {
            s.record_reminder(sent_at, tier_minutes)
        }) {
            Some(true) => Ok(()),
            Some(false) => Err(anyhow::anyhow!(
                "Reminder tier {} is not finer than the one already sent for subscription {}",
                tier_minutes,
                subscription_id
            )),
            None => Err(anyhow::anyhow!(
                "Subscription {} not found",
                subscription_id
            )),
        }
    }
}
