//! Conversation model for in-memory chat sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendered in place of image content when history is returned to a caller.
pub const IMAGE_MARKER: &str = "image";

/// Identifies one conversation. Structured rather than joined so that
/// distinct `(user_id, session_id)` pairs can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One unit of content sent to or received from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    /// Builds an image part, sniffing the MIME type from the leading bytes.
    pub fn image(data: Vec<u8>) -> Self {
        let mime_type = sniff_image_mime(&data).to_string();
        Part::Image { mime_type, data }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::Image { .. } => None,
        }
    }
}

/// Detects common image formats by magic bytes. Unknown data is labelled
/// JPEG, the format mobile clients upload by default.
pub fn sniff_image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Set when the model call carrying this turn failed. Still rendered in
    /// history, never sent to the model again.
    pub unanswered: bool,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            parts,
            unanswered: false,
        }
    }

    /// Content as shown in rendered history: the first part's text, or the
    /// image marker.
    pub fn display_content(&self) -> String {
        match self.parts.first() {
            Some(Part::Text(text)) => text.clone(),
            Some(Part::Image { .. }) => IMAGE_MARKER.to_string(),
            None => String::new(),
        }
    }
}

/// Rendered history item returned by the chat history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// An ongoing multi-turn exchange with the model.
///
/// The first `seed_len` turns are the seed exchange (system prompt and the
/// model's acknowledgement). They are sent to the model on every call but
/// never rendered back.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub key: SessionKey,
    turns: Vec<Turn>,
    seed_len: usize,
    seeded: bool,
}

impl Conversation {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            turns: Vec::new(),
            seed_len: 0,
            seeded: false,
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Records the seed exchange. Must be the first thing recorded.
    pub fn record_seed(&mut self, prompt: Turn, acknowledgement: Turn) {
        debug_assert!(self.turns.is_empty(), "seed must precede all other turns");
        self.turns.push(prompt);
        self.turns.push(acknowledgement);
        self.seed_len = self.turns.len();
        self.seeded = true;
    }

    /// Append a turn to the conversation.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Flag the most recent turn as unanswered after a failed model call.
    pub fn mark_last_unanswered(&mut self) {
        if let Some(turn) = self.turns.last_mut() {
            turn.unanswered = true;
        }
    }

    /// All turns including the seed exchange.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns in the form sent to the model. Unanswered turns are left out so
    /// one rejected message cannot fail every later call; adjacent turns from
    /// the same author (a user turn whose reply had no text) are merged so
    /// roles alternate.
    pub fn request_contents(&self) -> Vec<(Role, Vec<Part>)> {
        let mut contents: Vec<(Role, Vec<Part>)> = Vec::with_capacity(self.turns.len());
        for turn in self.turns.iter().filter(|turn| !turn.unanswered) {
            match contents.last_mut() {
                Some((role, parts)) if *role == turn.role => {
                    parts.extend(turn.parts.iter().cloned());
                }
                _ => contents.push((turn.role, turn.parts.clone())),
            }
        }
        contents
    }

    /// History without the seed exchange.
    pub fn render_history(&self) -> Vec<HistoryEntry> {
        self.turns
            .iter()
            .skip(self.seed_len)
            .map(|turn| HistoryEntry {
                role: turn.role,
                content: turn.display_content(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(key: SessionKey) -> Conversation {
        let mut conversation = Conversation::new(key);
        conversation.record_seed(
            Turn::new(Role::User, vec![Part::text("You are a cow expert")]),
            Turn::new(Role::Model, vec![Part::text("Understood")]),
        );
        conversation
    }

    #[test]
    fn session_keys_with_separator_in_ids_do_not_collide() {
        let a = SessionKey::new("alice_1", "x");
        let b = SessionKey::new("alice", "1_x");
        assert_ne!(a, b);
    }

    #[test]
    fn render_history_excludes_seed_exchange() {
        let mut conversation = seeded(SessionKey::new("u1", "s1"));
        assert!(conversation.render_history().is_empty());

        conversation.push(Turn::new(Role::User, vec![Part::text("Tell me about Gir cows")]));
        conversation.push(Turn::new(Role::Model, vec![Part::text("Gir cows are from Gujarat")]));

        let history = conversation.render_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "Tell me about Gir cows");
        assert_eq!(history[1].role, Role::Model);
    }

    #[test]
    fn image_first_turn_renders_marker() {
        let mut conversation = seeded(SessionKey::new("u1", "s1"));
        conversation.push(Turn::new(Role::User, vec![Part::image(vec![0xFF, 0xD8, 0xFF])]));

        let history = conversation.render_history();
        assert_eq!(history[0].content, IMAGE_MARKER);
    }

    #[test]
    fn request_contents_merge_adjacent_user_turns() {
        let mut conversation = seeded(SessionKey::new("u1", "s1"));
        conversation.push(Turn::new(Role::User, vec![Part::text("first try")]));
        conversation.push(Turn::new(Role::User, vec![Part::text("second try")]));

        let contents = conversation.request_contents();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[2].0, Role::User);
        assert_eq!(contents[2].1.len(), 2);
    }

    #[test]
    fn unanswered_turns_are_rendered_but_not_resent() {
        let mut conversation = seeded(SessionKey::new("u1", "s1"));
        conversation.push(Turn::new(Role::User, vec![Part::image(vec![0, 0, 0])]));
        conversation.mark_last_unanswered();
        conversation.push(Turn::new(Role::User, vec![Part::text("Tell me about Gir cows")]));

        let contents = conversation.request_contents();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[2].1, vec![Part::text("Tell me about Gir cows")]);

        let history = conversation.render_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, IMAGE_MARKER);
    }

    #[test]
    fn sniff_detects_png_gif_webp_and_defaults_to_jpeg() {
        assert_eq!(
            sniff_image_mime(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            "image/png"
        );
        assert_eq!(sniff_image_mime(b"GIF89a...."), "image/gif");
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_image_mime(&[]), "image/jpeg");
    }
}
