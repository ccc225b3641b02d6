use crate::shared::entity::{Entity, ID};

pub const DEFAULT_LOCALE: &str = "en";

/// A person talking to the bot on the messaging platform
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ID,
    /// Identity of the user on the messaging platform
    pub max_user_id: String,
    /// Chat the bot delivers messages to. A `User` without a chat
    /// can not receive reminders.
    pub chat_id: Option<String>,
    pub display_name: Option<String>,
    pub locale: String,
}

impl User {
    pub fn new(max_user_id: impl Into<String>) -> Self {
        Self {
            id: Default::default(),
            max_user_id: max_user_id.into(),
            chat_id: None,
            display_name: None,
            locale: DEFAULT_LOCALE.into(),
        }
    }
}

impl Entity for User {
    fn id(&self) -> &ID {
        &self.id
    }
}
