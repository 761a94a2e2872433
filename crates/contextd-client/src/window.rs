//! Prompt assembly from retrieved context.
//!
//! A [`ContextWindow`] renders semantic hits and recent turns into the text
//! block an agent prepends to the model prompt:
//!
//! ```text
//! --- RELEVANT CONTEXT FROM HISTORY ---
//! [user_query] how do I read a file in rust
//!
//! --- RECENT CONVERSATION ---
//! user: read main.rs
//! assistant: {"tool": "read_file", ...}
//!
//! --- CURRENT REQUEST ---
//! User: now add error handling
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::types::{ContextMatch, RecentMessage};

/// Relevant items rendered, nearest first.
pub const MAX_RELEVANT_ITEMS: usize = 3;

/// Characters kept from each relevant item.
pub const RELEVANT_PREVIEW_CHARS: usize = 200;

/// Characters kept from each recent turn.
pub const RECENT_PREVIEW_CHARS: usize = 150;

const RELEVANT_HEADER: &str = "\n--- RELEVANT CONTEXT FROM HISTORY ---";
const RECENT_HEADER: &str = "\n--- RECENT CONVERSATION ---";
const REQUEST_HEADER: &str = "\n--- CURRENT REQUEST ---";

/// Retrieved context plus the request it was retrieved for.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    preamble: Option<String>,
    relevant: Vec<ContextMatch>,
    /// Newest first, as returned by the recency view.
    recent: Vec<RecentMessage>,
    request: String,
}

impl ContextWindow {
    /// Assemble a window from query hits, a recency page, and the current request.
    pub fn build(
        relevant: Vec<ContextMatch>,
        recent: Vec<RecentMessage>,
        request: impl Into<String>,
    ) -> Self {
        Self {
            preamble: None,
            relevant,
            recent,
            request: request.into(),
        }
    }

    /// Text placed before the retrieved sections (system instructions, tool list).
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// The current request.
    pub fn request(&self) -> &str {
        &self.request
    }

    /// Whether any history was retrieved.
    pub fn has_history(&self) -> bool {
        !self.relevant.is_empty() || !self.recent.is_empty()
    }

    /// Render the prompt block.
    pub fn render(&self) -> String {
        let mut parts: Vec<Cow<'_, str>> = Vec::new();

        if let Some(preamble) = &self.preamble {
            parts.push(Cow::Borrowed(preamble));
        }

        if !self.relevant.is_empty() {
            parts.push(Cow::Borrowed(RELEVANT_HEADER));
            for hit in self.relevant.iter().take(MAX_RELEVANT_ITEMS) {
                parts.push(Cow::Owned(format!(
                    "[{}] {}",
                    hit.metadata.message_type,
                    preview(&hit.content, RELEVANT_PREVIEW_CHARS)
                )));
            }
        }

        if !self.recent.is_empty() {
            parts.push(Cow::Borrowed(RECENT_HEADER));
            for turn in self.recent.iter().rev() {
                parts.push(Cow::Owned(format!(
                    "{}: {}",
                    turn.metadata.role,
                    preview(&turn.content, RECENT_PREVIEW_CHARS)
                )));
            }
        }

        parts.push(Cow::Owned(format!("{}\nUser: {}", REQUEST_HEADER, self.request)));

        parts.join("\n")
    }
}

impl fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// First `max` characters of `content`, with `...` appended when cut.
fn preview(content: &str, max: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &content[..cut])),
        None => Cow::Borrowed(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContextMetadata;
    use serde_json::Map;

    fn metadata(role: &str, message_type: &str, timestamp: &str) -> ContextMetadata {
        ContextMetadata {
            session_id: "s1".to_string(),
            role: role.to_string(),
            message_type: message_type.to_string(),
            timestamp: timestamp.to_string(),
            content_length: 0,
            extra: Map::new(),
        }
    }

    fn hit(content: &str, message_type: &str) -> ContextMatch {
        ContextMatch {
            id: content.to_string(),
            content: content.to_string(),
            metadata: metadata("user", message_type, "2024-01-01T00:00:00Z"),
            distance: 0.1,
        }
    }

    fn turn(role: &str, content: &str, timestamp: &str) -> RecentMessage {
        RecentMessage {
            id: content.to_string(),
            content: content.to_string(),
            metadata: metadata(role, "chat", timestamp),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_request_only() {
        let window = ContextWindow::build(vec![], vec![], "fix the build");
        assert_eq!(window.render(), "\n--- CURRENT REQUEST ---\nUser: fix the build");
        assert!(!window.has_history());
    }

    #[test]
    fn test_full_layout() {
        let window = ContextWindow::build(
            vec![hit("how to read files", "user_query")],
            vec![
                turn("assistant", "done", "2024-01-02T00:00:01Z"),
                turn("user", "list files", "2024-01-02T00:00:00Z"),
            ],
            "now delete them",
        )
        .with_preamble("You are a coding agent.");

        let expected = "You are a coding agent.\n\
                        \n--- RELEVANT CONTEXT FROM HISTORY ---\n\
                        [user_query] how to read files\n\
                        \n--- RECENT CONVERSATION ---\n\
                        user: list files\n\
                        assistant: done\n\
                        \n--- CURRENT REQUEST ---\n\
                        User: now delete them";
        assert_eq!(window.render(), expected);
        assert_eq!(window.to_string(), expected);
    }

    #[test]
    fn test_relevant_capped_at_three() {
        let hits = (0..5).map(|i| hit(&format!("hit {}", i), "chat")).collect();
        let rendered = ContextWindow::build(hits, vec![], "q").render();

        assert!(rendered.contains("[chat] hit 2"));
        assert!(!rendered.contains("[chat] hit 3"));
    }

    #[test]
    fn test_previews_truncate_by_chars() {
        let long = "é".repeat(250);
        let rendered = ContextWindow::build(
            vec![hit(&long, "chat")],
            vec![turn("user", &long, "2024-01-01T00:00:00Z")],
            "q",
        )
        .render();

        assert!(rendered.contains(&format!("[chat] {}...", "é".repeat(200))));
        assert!(rendered.contains(&format!("user: {}...", "é".repeat(150))));
    }

    #[test]
    fn test_preview_exact_length_not_marked() {
        let exact = "x".repeat(RECENT_PREVIEW_CHARS);
        assert_eq!(preview(&exact, RECENT_PREVIEW_CHARS), exact.as_str());
    }
}
