use chrono::{DateTime, Duration, Utc};
use notibot_infra::{ISys, MockMessenger, NotibotContext};
use std::sync::{Arc, Mutex};

pub struct TestSys {
    now: Mutex<DateTime<Utc>>,
}

impl TestSys {
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl ISys for TestSys {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct TestApp {
    pub ctx: NotibotContext,
    pub sys: Arc<TestSys>,
    pub messenger: Arc<MockMessenger>,
}

/// In memory context with a controllable clock and a recording messenger
pub fn spawn_app(now: DateTime<Utc>) -> TestApp {
    let mut ctx = NotibotContext::create_inmemory();
    let sys = Arc::new(TestSys {
        now: Mutex::new(now),
    });
    let messenger = Arc::new(MockMessenger::new());
    ctx.sys = sys.clone();
    ctx.messenger = messenger.clone();

    TestApp {
        ctx,
        sys,
        messenger,
    }
}
