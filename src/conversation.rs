//! Conversation history for the assistant loop.
//!
//! The history is append-only: it is seeded with exactly one system turn and
//! grows by one user turn and one assistant turn per completed exchange. The
//! full history is sent to the response generator on every turn, so the serde
//! shape of [`Turn`] matches the chat-API wire format directly.
//!
//! The history is never truncated or summarized, so it grows without bound
//! for the lifetime of the process.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn in the conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered, append-only conversation history.
///
/// Owned exclusively by the orchestrator; there are no concurrent writers.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create a history seeded with a single system turn.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn {
                role: Role::System,
                content: system_prompt.into(),
            }],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// All turns in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        // Always seeded with a system turn.
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_holds_exactly_one_system_turn() {
        let conversation = Conversation::new("be helpful");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].role, Role::System);
        assert_eq!(conversation.turns()[0].content, "be helpful");
    }

    #[test]
    fn pushes_preserve_insertion_order() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("question");
        conversation.push_assistant("answer");

        let roles: Vec<Role> = conversation.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(conversation.last().unwrap().content, "answer");
    }

    #[test]
    fn turns_serialize_in_chat_wire_format() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("hi");

        let json = serde_json::to_string(conversation.turns()).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"system","content":"sys"},{"role":"user","content":"hi"}]"#
        );
    }
}
