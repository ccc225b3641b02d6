use super::IMessageLogRepo;
use chrono::{DateTime, Utc};
use notibot_domain::{MessageDirection, MessageLog, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresMessageLogRepo {
    pool: PgPool,
}

impl PostgresMessageLogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MessageLogRaw {
    message_log_uid: Uuid,
    user_uid: Option<Uuid>,
    event_uid: Option<Uuid>,
    direction: String,
    payload: serde_json::Value,
    status_code: Option<i32>,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MessageLogRaw> for MessageLog {
    fn from(raw: MessageLogRaw) -> Self {
        Self {
            id: raw.message_log_uid.into(),
            user_id: raw.user_uid.map(ID::from),
            event_id: raw.event_uid.map(ID::from),
            direction: MessageDirection::parse(&raw.direction)
                .unwrap_or(MessageDirection::Outgoing),
            payload: raw.payload,
            status_code: raw.status_code,
            error: raw.error,
            created_at: raw.created_at,
        }
    }
}

#[async_trait::async_trait]
impl IMessageLogRepo for PostgresMessageLogRepo {
    async fn record(&self, log: &MessageLog) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_logs
            (message_log_uid, user_uid, event_uid, direction, payload, status_code, error, created_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id.inner())
        .bind(log.user_id.map(ID::inner))
        .bind(log.event_id.map(ID::inner))
        .bind(log.direction.as_str())
        .bind(&log.payload)
        .bind(log.status_code)
        .bind(&log.error)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<MessageLog> {
        sqlx::query_as::<_, MessageLogRaw>(
            r#"
            SELECT * FROM message_logs AS l
            WHERE l.user_uid = $1
            ORDER BY l.created_at ASC
            "#,
        )
        .bind(user_id.inner())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find message logs of user {}: {:?}", user_id, e);
            vec![]
        })
        .into_iter()
        .map(|raw| raw.into())
        .collect()
    }
}
