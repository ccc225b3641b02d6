use super::setup::TestApp;
use chrono::{DateTime, Utc};
use notibot_core::{execute, AcceptSubscriptionUseCase, SendDueRemindersUseCase, SweepReport};
use notibot_domain::{Event, Subscription, User};

/// Stores a user and an event and lets the user accept it
pub async fn accepted_event(
    app: &TestApp,
    chat_id: &str,
    locale: &str,
    start_time: DateTime<Utc>,
) -> (User, Event, Subscription) {
    let mut user = User::new(format!("max-{}", chat_id));
    user.chat_id = Some(chat_id.to_string());
    user.locale = locale.to_string();
    app.ctx.repos.users.insert(&user).await.unwrap();

    let mut event = Event::new("Algorithms lecture", start_time);
    event.location = Some("Room 204".into());
    app.ctx.repos.events.insert(&event).await.unwrap();

    let subscription = execute(
        AcceptSubscriptionUseCase {
            user_id: user.id,
            event_id: event.id,
        },
        &app.ctx,
    )
    .await
    .expect("To accept subscription");

    (user, event, subscription)
}

pub async fn sweep(app: &TestApp) -> SweepReport {
    execute(SendDueRemindersUseCase {}, &app.ctx)
        .await
        .expect("Sweep to succeed")
}

pub async fn last_offset(app: &TestApp, subscription: &Subscription) -> Option<u32> {
    app.ctx
        .repos
        .subscriptions
        .find_by_user_and_event(&subscription.user_id, &subscription.event_id)
        .await
        .unwrap()
        .last_reminder_offset_minutes
}
