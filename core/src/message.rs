//! Chat messages.
//!
//! Local chat models expect a conversation flattened into a single prompt string. The types here
//! describe that conversation independently of any prompt template.

use alloc::string::String;

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    /// Input from the human user.
    User,
    /// Responses from the model.
    Assistant,
    /// Context and instructions for the model.
    System,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a message with an explicit role.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Returns the message sender role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_role() {
        assert_eq!(Message::user("hi").role(), Role::User);
        assert_eq!(Message::assistant("hello").role(), Role::Assistant);
        assert_eq!(Message::system("be brief").role(), Role::System);
        assert_eq!(Message::user("hi").content(), "hi");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Message::system("rules")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"rules"}"#);
    }
}
