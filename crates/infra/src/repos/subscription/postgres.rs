use super::ISubscriptionRepo;
use chrono::{DateTime, Utc};
use notibot_domain::{ReminderCandidate, Subscription, SubscriptionStatus, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresSubscriptionRepo {
    pool: PgPool,
}

impl PostgresSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRaw {
    subscription_uid: Uuid,
    user_uid: Uuid,
    event_uid: Uuid,
    status: String,
    locale: String,
    last_reminder_at: Option<DateTime<Utc>>,
    last_reminder_offset_minutes: Option<i32>,
}

impl From<SubscriptionRaw> for Subscription {
    fn from(raw: SubscriptionRaw) -> Self {
        Self {
            id: raw.subscription_uid.into(),
            user_id: raw.user_uid.into(),
            event_id: raw.event_uid.into(),
            status: SubscriptionStatus::parse(&raw.status).unwrap_or(SubscriptionStatus::Invited),
            locale: raw.locale,
            last_reminder_at: raw.last_reminder_at,
            last_reminder_offset_minutes: raw
                .last_reminder_offset_minutes
                .and_then(|offset| u32::try_from(offset).ok()),
        }
    }
}

#[derive(Debug, FromRow)]
struct ReminderCandidateRaw {
    subscription_uid: Uuid,
    user_uid: Uuid,
    event_uid: Uuid,
    chat_id: Option<String>,
    locale: String,
    event_start_time: Option<DateTime<Utc>>,
    event_title: String,
    event_location: Option<String>,
    last_reminder_at: Option<DateTime<Utc>>,
    last_reminder_offset_minutes: Option<i32>,
}

impl From<ReminderCandidateRaw> for ReminderCandidate {
    fn from(raw: ReminderCandidateRaw) -> Self {
        Self {
            subscription_id: raw.subscription_uid.into(),
            user_id: raw.user_uid.into(),
            event_id: raw.event_uid.into(),
            chat_id: raw.chat_id,
            locale: raw.locale,
            event_start_time: raw.event_start_time,
            event_title: raw.event_title,
            event_location: raw.event_location,
            last_reminder_at: raw.last_reminder_at,
            last_reminder_offset_minutes: raw
                .last_reminder_offset_minutes
                .and_then(|offset| u32::try_from(offset).ok()),
        }
    }
}

/// Offsets are stored in an `integer` column
fn offset_column(offset_minutes: u32) -> anyhow::Result<i32> {
    i32::try_from(offset_minutes).map_err(|_| {
        anyhow::anyhow!(
            "Reminder offset of {} minutes does not fit the offset column",
            offset_minutes
        )
    })
}

const CANDIDATES_QUERY: &str = r#"
    SELECT
        s.subscription_uid,
        s.user_uid,
        s.event_uid,
        u.chat_id,
        s.locale,
        e.start_time AS event_start_time,
        e.title AS event_title,
        e.location AS event_location,
        s.last_reminder_at,
        s.last_reminder_offset_minutes
    FROM subscriptions AS s
    INNER JOIN events AS e ON e.event_uid = s.event_uid
    INNER JOIN users AS u ON u.user_uid = s.user_uid
    WHERE s.status = 'accepted'
"#;

#[async_trait::async_trait]
impl ISubscriptionRepo for PostgresSubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
            (subscription_uid, user_uid, event_uid, status, locale, last_reminder_at, last_reminder_offset_minutes)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subscription.id.inner())
        .bind(subscription.user_id.inner())
        .bind(subscription.event_id.inner())
        .bind(subscription.status.as_str())
        .bind(&subscription.locale)
        .bind(subscription.last_reminder_at)
        .bind(subscription.last_reminder_offset_minutes.map(offset_column).transpose()?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2, locale = $3, last_reminder_at = $4, last_reminder_offset_minutes = $5
            WHERE subscription_uid = $1
            "#,
        )
        .bind(subscription.id.inner())
        .bind(subscription.status.as_str())
        .bind(&subscription.locale)
        .bind(subscription.last_reminder_at)
        .bind(subscription.last_reminder_offset_minutes.map(offset_column).transpose()?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user_and_event(&self, user_id: &ID, event_id: &ID) -> Option<Subscription> {
        sqlx::query_as::<_, SubscriptionRaw>(
            r#"
            SELECT * FROM subscriptions AS s
            WHERE s.user_uid = $1 AND s.event_uid = $2
            "#,
        )
        .bind(user_id.inner())
        .bind(event_id.inner())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!(
                "Unable to find subscription of user {} to event {}: {:?}",
                user_id, event_id, e
            );
            None
        })
        .map(|raw| raw.into())
    }

    async fn find_reminder_candidates(&self) -> anyhow::Result<Vec<ReminderCandidate>> {
        let candidates = sqlx::query_as::<_, ReminderCandidateRaw>(CANDIDATES_QUERY)
            .fetch_all(&self.pool)
            .await?;

        Ok(candidates.into_iter().map(|raw| raw.into()).collect())
    }

    async fn find_next_candidate_for_user(
        &self,
        user_id: &ID,
        after: DateTime<Utc>,
    ) -> anyhow::Result<Option<ReminderCandidate>> {
        let query = format!(
            "{} AND s.user_uid = $1 AND e.start_time >= $2 ORDER BY e.start_time ASC LIMIT 1",
            CANDIDATES_QUERY
        );
        let candidate = sqlx::query_as::<_, ReminderCandidateRaw>(&query)
            .bind(user_id.inner())
            .bind(after)
            .fetch_optional(&self.pool)
            .await?;

        Ok(candidate.map(|raw| raw.into()))
    }

    async fn commit_reminder(
        &self,
        subscription_id: &ID,
        sent_at: DateTime<Utc>,
        tier_minutes: u32,
    ) -> anyhow::Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE subscriptions
            SET last_reminder_at = $2, last_reminder_offset_minutes = $3
            WHERE subscription_uid = $1
                AND (last_reminder_offset_minutes IS NULL OR last_reminder_offset_minutes > $3)
            "#,
        )
        .bind(subscription_id.inner())
        .bind(sent_at)
        .bind(offset_column(tier_minutes)?)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            anyhow::bail!(
                "Subscription {} not found or tier {} is not finer than the one already sent",
                subscription_id,
                tier_minutes
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_beyond_the_column_range_are_rejected() {
        assert_eq!(offset_column(60).unwrap(), 60);
        assert_eq!(offset_column(i32::MAX as u32).unwrap(), i32::MAX);
        assert!(offset_column(i32::MAX as u32 + 1).is_err());
        assert!(offset_column(u32::MAX).is_err());
    }
}
