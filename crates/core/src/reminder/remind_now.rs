use super::deliver::deliver_reminder;
use crate::shared::usecase::UseCase;
use notibot_domain::{minutes_left, ID};
use notibot_infra::{NotibotContext, SendError, SentMessage};
use tracing::warn;

/// Sends a reminder for the next upcoming event of a user right away.
///
/// Ignores the reminder tiers and never touches the dedup marker of the
/// subscription.
#[derive(Debug)]
pub struct RemindNowUseCase {
    pub user_id: ID,
}

#[derive(Debug)]
pub struct RemindNowResponse {
    pub event_id: ID,
    pub minutes_left: i64,
    pub message: SentMessage,
}

#[derive(Debug)]
pub enum UseCaseError {
    UserNotFound(ID),
    NoUpcomingEvent,
    MissingChatId,
    Send(SendError),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for RemindNowUseCase {
    type Response = RemindNowResponse;

    type Errors = UseCaseError;

    const NAME: &'static str = "RemindNow";

    async fn execute(&mut self, ctx: &NotibotContext) -> Result<Self::Response, Self::Errors> {
        let user = match ctx.repos.users.find(&self.user_id).await {
            Some(user) => user,
            None => return Err(UseCaseError::UserNotFound(self.user_id)),
        };

        let now = ctx.sys.now();
        let candidate = ctx
            .repos
            .subscriptions
            .find_next_candidate_for_user(&user.id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .ok_or(UseCaseError::NoUpcomingEvent)?;
        let start_time = candidate
            .event_start_time
            .ok_or(UseCaseError::NoUpcomingEvent)?;

        let chat_id = match candidate.chat_id.as_deref() {
            Some(chat_id) if !chat_id.is_empty() => chat_id,
            _ => {
                warn!("User {} has no chat id, cannot send reminder", user.id);
                return Err(UseCaseError::MissingChatId);
            }
        };

        let minutes_left = minutes_left(start_time, now);
        let message = deliver_reminder(ctx, &candidate, chat_id, start_time, minutes_left, None)
            .await
            .map_err(UseCaseError::Send)?;

        Ok(RemindNowResponse {
            event_id: candidate.event_id,
            minutes_left,
            message,
        })
    }
}
