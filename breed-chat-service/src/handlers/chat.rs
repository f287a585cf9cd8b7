//! Multi-turn breed chat backed by the session registry.

use super::decode_base64_image;
use crate::dtos::{
    id_or_default, ChatBreedRequest, ChatBreedResponse, ChatHistoryQuery, ChatHistoryResponse,
    NewChatRequest, NewChatResponse, DEFAULT_SESSION_ID, DEFAULT_USER_ID,
};
use crate::models::{Part, SessionKey};
use crate::services::prompt::compose_chat_parts;
use crate::services::Language;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;
use service_core::extract::ApiJson;

/// Send a message (and optional image) to a breed chat session, creating the
/// session on first use.
pub async fn chat_breed(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChatBreedRequest>,
) -> Result<Json<ChatBreedResponse>, AppError> {
    let key = SessionKey::new(
        id_or_default(payload.user_id, DEFAULT_USER_ID),
        id_or_default(payload.session_id, DEFAULT_SESSION_ID),
    );
    let requested_language = payload.language.as_deref().map(Language::from_code);
    let language = requested_language.unwrap_or_default();

    let image = match payload.image.as_deref().filter(|s| !s.is_empty()) {
        Some(encoded) => Some(Part::image(
            decode_base64_image(encoded)
                .map_err(|e| AppError::processing(language.error_message(), e))?,
        )),
        None => None,
    };

    tracing::info!(
        session = %key,
        language = %language,
        has_image = image.is_some(),
        "Processing chat message"
    );

    let parts = compose_chat_parts(
        payload.message.as_deref().unwrap_or_default(),
        requested_language,
        image,
    );

    let reply = state
        .registry
        .chat(&key, parts)
        .await
        .map_err(|e| AppError::processing(language.error_message(), e))?;

    Ok(Json(ChatBreedResponse {
        response: reply.text_or(language.no_response_message()),
        session_id: key.session_id,
    }))
}

/// Start (or restart) a chat session.
pub async fn new_chat(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewChatRequest>,
) -> Result<Json<NewChatResponse>, AppError> {
    let session_id = match payload.session_id.filter(|s| !s.trim().is_empty()) {
        Some(id) => id,
        None => format!("session_{}", state.registry.len().await + 1),
    };
    let key = SessionKey::new(id_or_default(payload.user_id, DEFAULT_USER_ID), session_id);

    state
        .registry
        .reset(&key)
        .await
        .map_err(|e| AppError::processing(Language::default().error_message(), e))?;

    tracing::info!(session = %key, "New chat session created");

    Ok(Json(NewChatResponse {
        session_id: key.session_id,
        message: "New chat session created".to_string(),
    }))
}

/// Rendered history of a chat session.
pub async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let key = SessionKey::new(
        id_or_default(query.user_id, DEFAULT_USER_ID),
        id_or_default(query.session_id, DEFAULT_SESSION_ID),
    );

    let history = state
        .registry
        .history(&key)
        .await
        .ok_or_else(|| AppError::not_found("Chat session not found"))?;

    tracing::debug!(session = %key, turns = history.len(), "Fetched chat history");

    Ok(Json(ChatHistoryResponse { history }))
}
