use crate::shared::entity::{Entity, ID};
use crate::user::DEFAULT_LOCALE;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Invited,
    Accepted,
    Declined,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "invited" => Some(Self::Invited),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// A `User`s participation in an `Event`.
///
/// The `last_reminder_*` fields form the dedup marker of the reminder
/// scheduler. They are only written by a successful reminder dispatch and
/// cleared when the subscription is (re-)accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: ID,
    pub user_id: ID,
    pub event_id: ID,
    pub status: SubscriptionStatus,
    pub locale: String,
    /// When the last tiered reminder was successfully sent
    pub last_reminder_at: Option<DateTime<Utc>>,
    /// The finest (smallest) tier already sent. Never increases.
    pub last_reminder_offset_minutes: Option<u32>,
}

impl Subscription {
    pub fn new(user_id: ID, event_id: ID) -> Self {
        Self {
            id: Default::default(),
            user_id,
            event_id,
            status: SubscriptionStatus::Invited,
            locale: DEFAULT_LOCALE.into(),
            last_reminder_at: None,
            last_reminder_offset_minutes: None,
        }
    }

    /// Accepting starts the reminder lifecycle from scratch
    pub fn accept(&mut self, locale: &str) {
        self.status = SubscriptionStatus::Accepted;
        self.locale = locale.to_string();
        self.last_reminder_at = None;
        self.last_reminder_offset_minutes = None;
    }

    pub fn is_accepted(&self) -> bool {
        self.status == SubscriptionStatus::Accepted
    }

    /// Applies the outcome of a successful tiered reminder.
    ///
    /// Returns false and leaves the marker untouched when `tier_minutes`
    /// is not strictly finer than what was already sent.
    pub fn record_reminder(&mut self, sent_at: DateTime<Utc>, tier_minutes: u32) -> bool {
        if let Some(last) = self.last_reminder_offset_minutes {
            if tier_minutes >= last {
                return false;
            }
        }
        self.last_reminder_at = Some(sent_at);
        self.last_reminder_offset_minutes = Some(tier_minutes);
        true
    }
}

impl Entity for Subscription {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Read-only view of an accepted `Subscription` joined with its `Event`
/// and `User`, captured once per sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderCandidate {
    pub subscription_id: ID,
    pub user_id: ID,
    pub event_id: ID,
    pub chat_id: Option<String>,
    pub locale: String,
    pub event_start_time: Option<DateTime<Utc>>,
    pub event_title: String,
    pub event_location: Option<String>,
    pub last_reminder_at: Option<DateTime<Utc>>,
    pub last_reminder_offset_minutes: Option<u32>,
}
