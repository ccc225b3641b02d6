use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Lecture,
    Seminar,
    Meeting,
    Workshop,
    Deadline,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lecture => "lecture",
            Self::Seminar => "seminar",
            Self::Meeting => "meeting",
            Self::Workshop => "workshop",
            Self::Deadline => "deadline",
            Self::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "lecture" => Self::Lecture,
            "seminar" => Self::Seminar,
            "meeting" => Self::Meeting,
            "workshop" => Self::Workshop,
            "deadline" => Self::Deadline,
            _ => Self::Other,
        }
    }
}

impl Default for EventCategory {
    fn default() -> Self {
        Self::Other
    }
}

/// Something happening at a given time which `User`s can subscribe to
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: ID,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub location: Option<String>,
    /// Events imported from external sources may lack a start time,
    /// those never get reminders.
    pub start_time: Option<DateTime<Utc>>,
    pub organization: Option<String>,
}

impl Event {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Default::default(),
            title: title.into(),
            description: None,
            category: Default::default(),
            location: None,
            start_time: Some(start_time),
            organization: None,
        }
    }
}

impl Entity for Event {
    fn id(&self) -> &ID {
        &self.id
    }
}
