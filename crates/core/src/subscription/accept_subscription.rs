use crate::shared::usecase::UseCase;
use notibot_domain::{Subscription, ID};
use notibot_infra::NotibotContext;
use tracing::info;

/// Accepts the invitation of a `User` to an `Event`, creating the
/// `Subscription` if the user was never invited.
#[derive(Debug)]
pub struct AcceptSubscriptionUseCase {
    pub user_id: ID,
    pub event_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    UserNotFound(ID),
    EventNotFound(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for AcceptSubscriptionUseCase {
    type Response = Subscription;

    type Errors = UseCaseError;

    const NAME: &'static str = "AcceptSubscription";

    async fn execute(&mut self, ctx: &NotibotContext) -> Result<Self::Response, Self::Errors> {
        let user = match ctx.repos.users.find(&self.user_id).await {
            Some(user) => user,
            None => return Err(UseCaseError::UserNotFound(self.user_id)),
        };
        if ctx.repos.events.find(&self.event_id).await.is_none() {
            return Err(UseCaseError::EventNotFound(self.event_id));
        }

        let existing = ctx
            .repos
            .subscriptions
            .find_by_user_and_event(&user.id, &self.event_id)
            .await;
        let subscription = match existing {
            Some(mut subscription) => {
                subscription.accept(&user.locale);
                ctx.repos
                    .subscriptions
                    .save(&subscription)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
                subscription
            }
            None => {
                let mut subscription = Subscription::new(user.id, self.event_id);
                subscription.accept(&user.locale);
                ctx.repos
                    .subscriptions
                    .insert(&subscription)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
                subscription
            }
        };

        info!(
            "User {} accepted event {} (subscription {})",
            user.id, self.event_id, subscription.id
        );
        Ok(subscription)
    }
}
