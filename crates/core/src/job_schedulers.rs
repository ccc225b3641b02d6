use crate::{reminder::send_due_reminders::SendDueRemindersUseCase, shared::usecase::execute};
use notibot_infra::NotibotContext;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

#[derive(Error, Debug, PartialEq)]
pub enum SchedulerError {
    #[error(
        "Sweep interval of {interval} minutes is longer than the reminder tolerance of {tolerance} minutes, reminder windows would be missed"
    )]
    IntervalExceedsTolerance { interval: u32, tolerance: u32 },
    #[error("The reminder scheduler is already running")]
    AlreadyRunning,
}

/// Periodically runs the reminder sweep on the configured schedule.
///
/// A sweep always runs to completion before the next one can start. Ticks
/// that pass while a sweep is still running are dropped.
pub struct ReminderScheduler {
    ctx: NotibotContext,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(ctx: NotibotContext) -> Result<Self, SchedulerError> {
        let interval = ctx.config.sweep_schedule.interval_minutes();
        let tiers = &ctx.config.reminder_tiers;
        if !tiers.is_sweep_interval_safe(interval) {
            return Err(SchedulerError::IntervalExceedsTolerance {
                interval,
                tolerance: tiers.tolerance(),
            });
        }

        Ok(Self {
            ctx,
            shutdown: None,
            handle: None,
        })
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.handle.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.handle = Some(tokio::spawn(run_sweeps(self.ctx.clone(), shutdown_rx)));
        self.shutdown = Some(shutdown_tx);
        info!(
            "Reminder scheduler started. Sweeping every {} minutes for tiers {:?} with a tolerance of {} minutes",
            self.ctx.config.sweep_schedule.interval_minutes(),
            self.ctx.config.reminder_tiers.offsets(),
            self.ctx.config.reminder_tiers.tolerance()
        );
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Prevents new sweeps and waits for the one in flight, if any
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The loop is gone already if sending fails
            let _ = shutdown.send(true);
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Reminder scheduler terminated abnormally: {:?}", e);
            }
            info!("Reminder scheduler stopped");
        }
    }
}

async fn run_sweeps(ctx: NotibotContext, mut shutdown: watch::Receiver<bool>) {
    let schedule = ctx.config.sweep_schedule;
    let delay = schedule.delay_until_next_run(ctx.sys.now(), ctx.config.timezone);
    let mut sweeps = interval_at(Instant::now() + delay, schedule.interval());
    sweeps.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = sweeps.tick() => (),
        }

        let context = ctx.clone();
        // Awaited in place so that two sweeps never run at the same time
        let sweep = tokio::spawn(async move {
            // Errors are logged by the executor
            let _ = execute(SendDueRemindersUseCase {}, &context).await;
        });
        if let Err(e) = sweep.await {
            error!("Reminder sweep panicked: {:?}", e);
        }
    }
}
