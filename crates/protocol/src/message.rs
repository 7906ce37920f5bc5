use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the widget.
    User,
    /// The backend assistant.
    Bot,
}

impl Role {
    /// Maps a role string from the wire.
    ///
    /// Backends only ever distinguish the user from everything else, so
    /// any value other than `"user"` is treated as the bot.
    #[inline]
    pub fn from_wire(role: &str) -> Self {
        if role == "user" { Role::User } else { Role::Bot }
    }
}

/// A complete chat message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// The author of the message.
    pub role: Role,
    /// The message text, possibly empty but never absent.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a bot message.
    #[inline]
    pub fn bot<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }
}

/// The decoded conversation history of a user.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum History {
    /// The user has no messages yet, or the payload carried none.
    Empty,
    /// Stored messages in chronological order. Never empty.
    Messages(Vec<Message>),
}

impl History {
    /// Creates a `History` from decoded messages, collapsing an empty list
    /// into [`History::Empty`].
    #[inline]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        if messages.is_empty() {
            History::Empty
        } else {
            History::Messages(messages)
        }
    }

    /// Returns the stored messages.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        match self {
            History::Empty => &[],
            History::Messages(messages) => messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_wire() {
        assert_eq!(Role::from_wire("user"), Role::User);
        assert_eq!(Role::from_wire("bot"), Role::Bot);
        assert_eq!(Role::from_wire("assistant"), Role::Bot);
    }

    #[test]
    fn test_serialize_message() {
        let msg = Message::user("hi");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"user","content":"hi"}"#
        );
    }

    #[test]
    fn test_history_from_messages() {
        assert_eq!(History::from_messages(vec![]), History::Empty);
        let history = History::from_messages(vec![Message::bot("hello")]);
        assert_eq!(history.messages(), &[Message::bot("hello")]);
    }
}
