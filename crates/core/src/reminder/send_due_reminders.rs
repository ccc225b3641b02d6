use super::deliver::deliver_reminder;
use crate::shared::usecase::UseCase;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use notibot_domain::{decide_reminder, ReminderCandidate, ReminderDecision};
use notibot_infra::NotibotContext;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// One sweep over every accepted subscription. Sends at most one reminder
/// per subscription, for the tier whose window contains the time left.
#[derive(Debug)]
pub struct SendDueRemindersUseCase {}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Unable to load reminder candidates: {0}")]
    Snapshot(String),
    #[error("Loading reminder candidates timed out after {0:?}")]
    SnapshotTimeout(Duration),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub candidates: usize,
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    pub missing_chat_id: usize,
    /// Delivered, but the dedup marker could not be stored
    pub uncommitted: usize,
}

#[derive(Debug)]
struct DueReminder {
    candidate: ReminderCandidate,
    start_time: DateTime<Utc>,
    tier_minutes: u32,
    minutes_left: i64,
}

#[derive(Debug, PartialEq)]
enum DispatchOutcome {
    Sent,
    SentUncommitted,
    Failed,
    MissingChatId,
}

async fn dispatch(due: DueReminder, now: DateTime<Utc>, ctx: &NotibotContext) -> DispatchOutcome {
    let candidate = &due.candidate;
    let chat_id = match candidate.chat_id.as_deref() {
        Some(chat_id) if !chat_id.is_empty() => chat_id,
        _ => {
            warn!(
                "User {} has no chat id, skipping {} minute reminder for event {}",
                candidate.user_id, due.tier_minutes, candidate.event_id
            );
            return DispatchOutcome::MissingChatId;
        }
    };

    let sent = deliver_reminder(
        ctx,
        candidate,
        chat_id,
        due.start_time,
        due.minutes_left,
        Some(due.tier_minutes),
    )
    .await;
    if sent.is_err() {
        return DispatchOutcome::Failed;
    }

    let commit = ctx.repos.subscriptions.commit_reminder(
        &candidate.subscription_id,
        now,
        due.tier_minutes,
    );
    match timeout(ctx.config.storage_timeout, commit).await {
        Ok(Ok(())) => {
            info!(
                "Sent {} minute reminder for event {} to user {}",
                due.tier_minutes, candidate.event_id, candidate.user_id
            );
            DispatchOutcome::Sent
        }
        Ok(Err(e)) => {
            error!(
                "Reminder for subscription {} was sent but not committed: {:?}",
                candidate.subscription_id, e
            );
            DispatchOutcome::SentUncommitted
        }
        Err(_) => {
            error!(
                "Reminder for subscription {} was sent but committing timed out after {:?}",
                candidate.subscription_id, ctx.config.storage_timeout
            );
            DispatchOutcome::SentUncommitted
        }
    }
}

#[async_trait::async_trait]
impl UseCase for SendDueRemindersUseCase {
    type Response = SweepReport;

    type Errors = SweepError;

    const NAME: &'static str = "SendDueReminders";

    async fn execute(&mut self, ctx: &NotibotContext) -> Result<Self::Response, Self::Errors> {
        // Every decision and commit in this sweep uses the same instant
        let now = ctx.sys.now();

        let candidates = match timeout(
            ctx.config.storage_timeout,
            ctx.repos.subscriptions.find_reminder_candidates(),
        )
        .await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => return Err(SweepError::Snapshot(e.to_string())),
            Err(_) => return Err(SweepError::SnapshotTimeout(ctx.config.storage_timeout)),
        };

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        let tiers = &ctx.config.reminder_tiers;
        let due = candidates
            .into_iter()
            .filter_map(|candidate| {
                match decide_reminder(
                    tiers,
                    candidate.event_start_time,
                    candidate.last_reminder_offset_minutes,
                    now,
                ) {
                    ReminderDecision::Send {
                        tier_minutes,
                        minutes_left,
                    } => Some(DueReminder {
                        start_time: candidate.event_start_time?,
                        candidate,
                        tier_minutes,
                        minutes_left,
                    }),
                    ReminderDecision::Skip(_) => None,
                }
            })
            .collect::<Vec<_>>();
        report.due = due.len();

        let outcomes = stream::iter(due)
            .map(|due| dispatch(due, now, ctx))
            .buffer_unordered(ctx.config.dispatch_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        for outcome in outcomes {
            match outcome {
                DispatchOutcome::Sent => report.sent += 1,
                DispatchOutcome::SentUncommitted => {
                    report.sent += 1;
                    report.uncommitted += 1;
                }
                DispatchOutcome::Failed => report.failed += 1,
                DispatchOutcome::MissingChatId => report.missing_chat_id += 1,
            }
        }

        info!(
            "Reminder sweep at {}: {} candidates, {} due, {} sent, {} failed",
            now, report.candidates, report.due, report.sent, report.failed
        );
        Ok(report)
    }
}
