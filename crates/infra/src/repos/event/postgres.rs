use super::IEventRepo;
use std::convert::TryFrom;
use chrono::{DateTime, Utc};
use notibot_domain::{Event, EventCategory, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    title: String,
    description: Option<String>,
    category: String,
    location: Option<String>,
    start_time: Option<DateTime<Utc>>,
    organization: Option<String>,
}

impl From<EventRaw> for Event {
    fn from(raw: EventRaw) -> Self {
        Self {
            id: raw.event_uid.into(),
            title: raw.title,
            description: raw.description,
            category: EventCategory::parse(&raw.category),
            location: raw.location,
            start_time: raw.start_time,
            organization: raw.organization,
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, event: &Event) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events(event_uid, title, description, category, location, start_time, organization)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id.inner())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.as_str())
        .bind(&event.location)
        .bind(event.start_time)
        .bind(&event.organization)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<Event> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.inner())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find event {}: {:?}", event_id, e);
            None
        })
        .map(|raw| raw.into())
    }

    async fn count(&self) -> anyhow::Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count)?)
    }
}
