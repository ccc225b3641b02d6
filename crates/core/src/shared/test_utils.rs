use chrono::{DateTime, Duration as ChronoDuration, Utc};
use notibot_domain::{Event, ReminderMessage, Subscription, User};
use notibot_infra::{IMessenger, ISys, NotibotContext, SendError, SentMessage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Clock that only moves when told to
pub struct StaticTimeSys {
    now: Mutex<DateTime<Utc>>,
}

impl StaticTimeSys {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl ISys for StaticTimeSys {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Messenger that fails for some chats and optionally takes a while to answer
#[derive(Default)]
pub struct ScriptedMessenger {
    pub failing_chats: Vec<String>,
    pub delay: Option<Duration>,
    sent: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedMessenger {
    pub fn failing_for(chats: &[&str]) -> Self {
        Self {
            failing_chats: chats.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IMessenger for ScriptedMessenger {
    async fn send_message(
        &self,
        chat_id: &str,
        _message: &ReminderMessage,
    ) -> Result<SentMessage, SendError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_chats.iter().any(|c| c == chat_id) {
            return Err(SendError::Unavailable);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(chat_id.to_string());
        Ok(SentMessage {
            status: 200,
            id: format!("scripted-{}", sent.len()),
        })
    }
}

pub fn setup_context(now: DateTime<Utc>) -> (NotibotContext, Arc<StaticTimeSys>) {
    let mut ctx = NotibotContext::create_inmemory();
    let sys = Arc::new(StaticTimeSys::new(now));
    ctx.sys = sys.clone();
    (ctx, sys)
}

/// Stores a user with `chat_id` who accepted an event starting at `start_time`
pub async fn accepted_subscription(
    ctx: &NotibotContext,
    chat_id: Option<&str>,
    start_time: Option<DateTime<Utc>>,
) -> Subscription {
    let mut user = User::new(format!("max-{}", chat_id.unwrap_or("none")));
    user.chat_id = chat_id.map(String::from);
    ctx.repos.users.insert(&user).await.unwrap();

    let mut event = Event::new("Lab", Utc::now());
    event.start_time = start_time;
    ctx.repos.events.insert(&event).await.unwrap();

    let mut subscription = Subscription::new(user.id, event.id);
    subscription.accept("en");
    ctx.repos.subscriptions.insert(&subscription).await.unwrap();
    subscription
}
