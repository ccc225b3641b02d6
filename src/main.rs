mod telemetry;

use notibot_core::ReminderScheduler;
use notibot_infra::setup_context;
use telemetry::{get_subscriber, init_subscriber};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();
    // A missing .env file is fine, the environment may be set already
    dotenvy::dotenv().ok();

    let subscriber = get_subscriber("notibot".into(), "info".into());
    init_subscriber(subscriber)?;

    let context = setup_context().await?;

    let mut scheduler = ReminderScheduler::new(context)?;
    scheduler.start()?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, waiting for the running sweep to finish");
    scheduler.stop().await;

    Ok(())
}
