use super::IUserRepo;
use notibot_domain::{User, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRaw {
    user_uid: Uuid,
    max_user_id: String,
    chat_id: Option<String>,
    display_name: Option<String>,
    locale: String,
}

impl From<UserRaw> for User {
    fn from(raw: UserRaw) -> Self {
        Self {
            id: raw.user_uid.into(),
            max_user_id: raw.max_user_id,
            chat_id: raw.chat_id,
            display_name: raw.display_name,
            locale: raw.locale,
        }
    }
}

#[async_trait::async_trait]
impl IUserRepo for PostgresUserRepo {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users(user_uid, max_user_id, chat_id, display_name, locale)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.inner())
        .bind(&user.max_user_id)
        .bind(&user.chat_id)
        .bind(&user.display_name)
        .bind(&user.locale)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, user_id: &ID) -> Option<User> {
        sqlx::query_as::<_, UserRaw>(
            r#"
            SELECT * FROM users AS u
            WHERE u.user_uid = $1
            "#,
        )
        .bind(user_id.inner())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find user {}: {:?}", user_id, e);
            None
        })
        .map(|raw| raw.into())
    }
}
