mod event;
mod message_log;
mod shared;
mod subscription;
mod user;

pub use event::IEventRepo;
use event::{InMemoryEventRepo, PostgresEventRepo};
pub use message_log::IMessageLogRepo;
use message_log::{InMemoryMessageLogRepo, PostgresMessageLogRepo};
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
pub use subscription::ISubscriptionRepo;
use subscription::{InMemorySubscriptionRepo, PostgresSubscriptionRepo};
use tracing::info;
pub use user::IUserRepo;
use user::{InMemoryUserRepo, PostgresUserRepo};

#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn IUserRepo>,
    pub events: Arc<dyn IEventRepo>,
    pub subscriptions: Arc<dyn ISubscriptionRepo>,
    pub message_logs: Arc<dyn IMessageLogRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        run_migration(&pool).await?;

        Ok(Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
            message_logs: Arc::new(PostgresMessageLogRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        let users = Arc::new(InMemoryUserRepo::new());
        let events = Arc::new(InMemoryEventRepo::new());
        Self {
            subscriptions: Arc::new(InMemorySubscriptionRepo::new(
                users.clone(),
                events.clone(),
            )),
            users,
            events,
            message_logs: Arc::new(InMemoryMessageLogRepo::new()),
        }
    }
}

async fn run_migration(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!().run(pool).await
}
