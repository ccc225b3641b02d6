mod event;
mod message;
mod reminder;
mod shared;
mod subscription;
mod user;

pub use event::{Event, EventCategory};
pub use message::{Card, CardAction, CardText, MessageDirection, MessageLog, ReminderMessage};
pub use reminder::{
    decide_reminder, minutes_left, InvalidTiersError, ReminderDecision, ReminderTiers,
    SkipReason, DEFAULT_REMINDER_OFFSETS, DEFAULT_REMINDER_TOLERANCE, MAX_REMINDER_OFFSET,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use subscription::{ReminderCandidate, Subscription, SubscriptionStatus};
pub use user::{User, DEFAULT_LOCALE};

pub use chrono_tz::Tz;
