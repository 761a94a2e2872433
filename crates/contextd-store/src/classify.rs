//! Write-time message classification.

use crate::types::MessageType;

/// Classify a message. Rules apply in order, first match wins:
///
/// 1. role `user` is a [`MessageType::UserQuery`]
/// 2. content mentioning `tool` (any case, which covers `{"tool":` payloads)
///    is a [`MessageType::ToolCall`]
/// 3. role `assistant` is a [`MessageType::AgentResponse`]
/// 4. anything else is [`MessageType::Chat`]
pub fn classify(role: &str, content: &str) -> MessageType {
    if role == "user" {
        MessageType::UserQuery
    } else if content.to_lowercase().contains("tool") {
        MessageType::ToolCall
    } else if role == "assistant" {
        MessageType::AgentResponse
    } else {
        MessageType::Chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let cases = [
            ("user", "please use the tool", MessageType::UserQuery),
            ("assistant", "{\"tool\": \"x\"}", MessageType::ToolCall),
            ("assistant", "Running TOOL now", MessageType::ToolCall),
            ("assistant", "hello", MessageType::AgentResponse),
            ("system", "hello", MessageType::Chat),
            ("system", "toolbox", MessageType::ToolCall),
        ];

        for (role, content, expected) in cases {
            assert_eq!(classify(role, content), expected, "{role}: {content}");
        }
    }

    #[test]
    fn test_role_is_case_sensitive() {
        assert_eq!(classify("User", "hi"), MessageType::Chat);
    }
}
