use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locale {
    En,
    Ru,
}

impl Locale {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("ru") {
            Self::Ru
        } else {
            Self::En
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardText {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl CardText {
    fn plain(text: String) -> Self {
        Self {
            kind: "text".into(),
            text,
            style: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub header: String,
    pub body: Vec<CardText>,
    pub actions: Vec<CardAction>,
}

/// Structured message telling a `User` that an `Event` is about to start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub locale: String,
    pub content: Card,
}

impl ReminderMessage {
    /// Renders the reminder in the user's locale. Unknown locales fall back
    /// to english. The start time is shown in `timezone`.
    pub fn build(
        locale: &str,
        title: &str,
        start_time: DateTime<Utc>,
        location: Option<&str>,
        minutes_left: i64,
        timezone: Tz,
    ) -> Self {
        let locale = Locale::parse(locale);
        let (header, time_label, location_label, minutes_label, action) = match locale {
            Locale::Ru => (
                "Напоминание о событии",
                "Время",
                "Место",
                format!("Через {} мин.", minutes_left),
                "Показать расписание",
            ),
            Locale::En => (
                "Event reminder",
                "Time",
                "Location",
                format!("In {} min", minutes_left),
                "Show my schedule",
            ),
        };
        let local_start = start_time.with_timezone(&timezone);
        let formatted_start = match locale {
            Locale::Ru => local_start.format("%d.%m.%Y, %H:%M").to_string(),
            Locale::En => local_start.format("%m/%d/%Y, %I:%M %p").to_string(),
        };

        let mut body = vec![CardText {
            kind: "text".into(),
            text: title.to_string(),
            style: Some("header".into()),
        }];
        body.push(CardText::plain(format!("{}: {}", time_label, formatted_start)));
        if let Some(location) = location {
            body.push(CardText::plain(format!("{}: {}", location_label, location)));
        }
        body.push(CardText::plain(minutes_label));

        Self {
            kind: "structured".into(),
            locale: locale.as_str().into(),
            content: Card {
                kind: "card".into(),
                version: "1.0".into(),
                header: header.into(),
                body,
                actions: vec![CardAction {
                    kind: "reply".into(),
                    title: action.into(),
                    payload: action.into(),
                }],
            },
        }
    }

    /// Payload stored in the audit trail for this reminder
    pub fn audit_payload(&self, tier_minutes: Option<u32>) -> serde_json::Value {
        let mut payload = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(fields) = &mut payload {
            fields.insert("reminder".into(), serde_json::Value::Bool(true));
            if let Some(tier) = tier_minutes {
                fields.insert("tierMinutes".into(), tier.into());
            }
        }
        payload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "incoming" => Some(Self::Incoming),
            "outgoing" => Some(Self::Outgoing),
            _ => None,
        }
    }
}

/// Audit trail entry for a message exchanged with the messaging platform
#[derive(Debug, Clone, PartialEq)]
pub struct MessageLog {
    pub id: ID,
    pub user_id: Option<ID>,
    pub event_id: Option<ID>,
    pub direction: MessageDirection,
    pub payload: serde_json::Value,
    pub status_code: Option<i32>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageLog {
    pub fn outgoing(
        user_id: ID,
        event_id: ID,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id: Some(user_id),
            event_id: Some(event_id),
            direction: MessageDirection::Outgoing,
            payload,
            status_code: None,
            error: None,
            created_at,
        }
    }
}

impl Entity for MessageLog {
    fn id(&self) -> &ID {
        &self.id
    }
}
