mod messenger;

pub use messenger::{IMessenger, MaxPlatformMessenger, MockMessenger, SendError, SentMessage};
