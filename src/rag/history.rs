//! Folding chat history into a single retrieval query.
//!
//! The web client sends its conversation as `{"type": "user"|"ai", "content"}`
//! items. Any type other than `user` is treated as the assistant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn role(&self) -> &'static str {
        if self.kind == "user" {
            "User"
        } else {
            "Assistant"
        }
    }
}

fn tail(history: &[ChatTurn], n: usize) -> &[ChatTurn] {
    &history[history.len().saturating_sub(n)..]
}

/// Transcript form: the last `window` turns as `Role: content` lines,
/// followed by `User: {question}`. Returns the bare question when the
/// history is empty.
pub fn transcript(history: &[ChatTurn], question: &str, window: usize) -> String {
    let recent = tail(history, window);
    if recent.is_empty() {
        return question.to_string();
    }
    let mut lines: Vec<String> = recent
        .iter()
        .map(|t| format!("{}: {}", t.role(), t.content))
        .collect();
    lines.push(format!("User: {question}"));
    lines.join("\n")
}

/// Labelled form: `Previous conversation:` block plus `Current question:`.
/// Turns with empty content are skipped; returns the bare question when
/// nothing is left.
pub fn previous_conversation(history: &[ChatTurn], question: &str, window: usize) -> String {
    let parts: Vec<String> = tail(history, window)
        .iter()
        .filter(|t| !t.content.is_empty())
        .map(|t| format!("{}: {}", t.role(), t.content))
        .collect();
    if parts.is_empty() {
        return question.to_string();
    }
    format!(
        "Previous conversation:\n{}\n\nCurrent question: {question}",
        parts.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(kind: &str, content: &str) -> ChatTurn {
        ChatTurn {
            kind: kind.into(),
            content: content.into(),
        }
    }

    #[test]
    fn empty_history_is_bare_question() {
        assert_eq!(transcript(&[], "Q?", 6), "Q?");
        assert_eq!(previous_conversation(&[], "Q?", 4), "Q?");
    }

    #[test]
    fn transcript_keeps_last_window_including_empty() {
        let h: Vec<ChatTurn> = (0..8)
            .map(|i| turn(if i % 2 == 0 { "user" } else { "ai" }, &format!("m{i}")))
            .collect();
        let out = transcript(&h, "next?", 6);
        assert_eq!(
            out,
            "User: m2\nAssistant: m3\nUser: m4\nAssistant: m5\nUser: m6\nAssistant: m7\nUser: next?"
        );

        let with_empty = vec![turn("user", "")];
        assert_eq!(transcript(&with_empty, "q", 6), "User: \nUser: q");
    }

    #[test]
    fn previous_conversation_skips_empty_and_unknown_roles_are_assistant() {
        let h = vec![
            turn("user", "old"),
            turn("user", "What is X?"),
            turn("bot", "X is Y."),
            turn("user", ""),
            turn("ai", "Anything else?"),
        ];
        assert_eq!(
            previous_conversation(&h, "And Z?", 4),
            "Previous conversation:\nUser: What is X?\nAssistant: X is Y.\nAssistant: Anything else?\n\nCurrent question: And Z?"
        );
    }

    #[test]
    fn all_empty_window_is_bare_question() {
        let h = vec![turn("user", "kept out of window"), turn("user", ""), turn("ai", "")];
        assert_eq!(previous_conversation(&h, "q", 2), "q");
    }

    #[test]
    fn deserialises_client_shape() {
        let t: ChatTurn = serde_json::from_str(r#"{"type":"user","content":"hi","id":3}"#).unwrap();
        assert_eq!(t.role(), "User");
        let t: ChatTurn = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(t.role(), "Assistant");
    }
}
