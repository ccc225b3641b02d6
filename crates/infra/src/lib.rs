mod config;
mod repos;
mod seed;
mod services;
mod system;

pub use config::{Config, ConfigError, MessengerConfig, SweepSchedule};
pub use repos::Repos;
pub use repos::{IEventRepo, IMessageLogRepo, ISubscriptionRepo, IUserRepo};
pub use seed::{ensure_seed_data, load_datasets, SeedDataset, SeedEvent};
pub use services::*;
use std::sync::Arc;
pub use system::{ISys, RealSys};
use tracing::info;

#[derive(Clone)]
pub struct NotibotContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub messenger: Arc<dyn IMessenger>,
}

impl NotibotContext {
    async fn create(config: Config) -> anyhow::Result<Self> {
        let repos = match &config.database_url {
            Some(url) => Repos::create_postgres(url).await?,
            None => Repos::create_inmemory(),
        };
        ensure_seed_data(&repos, config.data_source_path.as_deref()).await?;
        let messenger: Arc<dyn IMessenger> = if config.messenger.use_mock {
            info!("USE_MOCK_MAX_API is enabled. Messages will not leave the process.");
            Arc::new(MockMessenger::new())
        } else {
            Arc::new(MaxPlatformMessenger::new(&config.messenger)?)
        };

        Ok(Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            messenger,
        })
    }

    /// Context with in memory storage, a mock messenger and default config
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::default(),
            sys: Arc::new(RealSys {}),
            messenger: Arc::new(MockMessenger::new()),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<NotibotContext> {
    NotibotContext::create(Config::new()).await
}
