use chrono::{DateTime, Utc};
use notibot_domain::{MessageLog, ReminderCandidate, ReminderMessage};
use notibot_infra::{NotibotContext, SendError, SentMessage};
use tokio::time::timeout;
use tracing::{error, warn};

/// Renders and sends a reminder for `candidate` to `chat_id`, then writes
/// the outcome to the audit trail.
///
/// The send is bounded by the messenger timeout. Failing to write the audit
/// record is logged and does not change the returned outcome.
pub async fn deliver_reminder(
    ctx: &NotibotContext,
    candidate: &ReminderCandidate,
    chat_id: &str,
    start_time: DateTime<Utc>,
    minutes_left: i64,
    tier_minutes: Option<u32>,
) -> Result<SentMessage, SendError> {
    let message = ReminderMessage::build(
        &candidate.locale,
        &candidate.event_title,
        start_time,
        candidate.event_location.as_deref(),
        minutes_left,
        ctx.config.timezone,
    );

    let send_timeout = ctx.config.messenger.timeout;
    let res = match timeout(send_timeout, ctx.messenger.send_message(chat_id, &message)).await {
        Ok(res) => res,
        Err(_) => Err(SendError::Timeout(send_timeout)),
    };

    let mut log = MessageLog::outgoing(
        candidate.user_id,
        candidate.event_id,
        message.audit_payload(tier_minutes),
        ctx.sys.now(),
    );
    match &res {
        Ok(sent) => log.status_code = Some(i32::from(sent.status)),
        Err(e) => {
            log.status_code = Some(e.status_code());
            log.error = Some(e.to_string());
            if e.is_transient() {
                warn!(
                    "Reminder for subscription {} (user {}, event {}) not delivered, will retry: {}",
                    candidate.subscription_id, candidate.user_id, candidate.event_id, e
                );
            } else {
                error!(
                    "Reminder for subscription {} (user {}, event {}) not delivered: {}",
                    candidate.subscription_id, candidate.user_id, candidate.event_id, e
                );
            }
        }
    }
    record_audit(ctx, &log).await;

    res
}

async fn record_audit(ctx: &NotibotContext, log: &MessageLog) {
    match timeout(ctx.config.storage_timeout, ctx.repos.message_logs.record(log)).await {
        Ok(Ok(())) => (),
        Ok(Err(e)) => error!("Unable to store message log {}: {:?}", log.id, e),
        Err(_) => error!(
            "Storing message log {} timed out after {:?}",
            log.id, ctx.config.storage_timeout
        ),
    }
}
