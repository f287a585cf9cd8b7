use crate::models::HistoryEntry;
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ID: &str = "default_user";
pub const DEFAULT_SESSION_ID: &str = "default_session";

#[derive(Debug, Default, Deserialize)]
pub struct ImageToTextRequest {
    pub image_base64: Option<String>,
    pub prompt: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextPromptRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatBreedRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub message: Option<String>,
    /// Base64-encoded image bytes.
    pub image: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatBreedResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewChatRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewChatResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatHistoryQuery {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Caller-supplied id, or `default` when absent or blank.
pub fn id_or_default(id: Option<String>, default: &str) -> String {
    id.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
