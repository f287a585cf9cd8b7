//! One-shot generation endpoints: image analysis, text questions and a
//! single chat-persona exchange.

use super::decode_base64_image;
use crate::dtos::{ImageToTextRequest, ResultResponse, TextPromptRequest};
use crate::models::Part;
use crate::services::prompt::{compose_image_parts, compose_text_prompt, CHAT_PERSONA};
use crate::services::providers::{generate_recorded, GenerationRequest, Message};
use crate::services::Language;
use crate::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::ApiJson;

/// Analyze a base64-encoded cow image.
pub async fn image_to_text(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ImageToTextRequest>,
) -> Result<Json<ResultResponse>, AppError> {
    let language = Language::from_optional(payload.language.as_deref());

    let encoded = payload
        .image_base64
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("Image (base64 encoded) is required"))?;

    let image = decode_base64_image(&encoded)
        .map_err(|e| AppError::processing(language.error_message(), e))?;

    tracing::info!(
        language = %language,
        image_bytes = image.len(),
        has_prompt = payload.prompt.is_some(),
        "Analyzing image"
    );

    let request = GenerationRequest {
        model: state.config.models.image_model.clone(),
        system_instruction: None,
        contents: vec![Message::user(compose_image_parts(
            payload.prompt.as_deref(),
            language,
            Part::image(image),
        ))],
        params: state.config.models.image_params,
    };

    let reply = generate_recorded(state.provider.as_ref(), "image_to_text", &request)
        .await
        .map_err(|e| AppError::processing(language.error_message(), e))?;

    Ok(Json(ResultResponse {
        result: reply.text_or(language.no_response_message()),
    }))
}

/// Answer a one-shot text question with the breed persona.
pub async fn text_to_text(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TextPromptRequest>,
) -> Result<Json<ResultResponse>, AppError> {
    let language = Language::default();
    let prompt = payload.prompt.unwrap_or_default();

    tracing::info!(prompt_chars = prompt.chars().count(), "Answering text prompt");

    let request = GenerationRequest {
        model: state.config.models.text_model.clone(),
        system_instruction: None,
        contents: vec![Message::user(vec![Part::Text(compose_text_prompt(&prompt))])],
        params: state.config.models.text_params,
    };

    let reply = generate_recorded(state.provider.as_ref(), "text_to_text", &request)
        .await
        .map_err(|e| AppError::processing(language.error_message(), e))?;

    Ok(Json(ResultResponse {
        result: reply.text_or(language.no_response_message()),
    }))
}

/// Single exchange with the chat persona. Nothing is kept between calls.
pub async fn text_to_text_chat(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TextPromptRequest>,
) -> Result<Json<ResultResponse>, AppError> {
    let language = Language::default();
    let prompt = payload.prompt.unwrap_or_default();

    tracing::info!(prompt_chars = prompt.chars().count(), "Answering chat prompt");

    let request = GenerationRequest {
        model: state.config.models.chat_model.clone(),
        system_instruction: Some(CHAT_PERSONA.to_string()),
        contents: vec![Message::user(vec![Part::Text(prompt)])],
        params: state.config.models.chat_params,
    };

    let reply = generate_recorded(state.provider.as_ref(), "text_to_text_chat", &request)
        .await
        .map_err(|e| AppError::processing(language.error_message(), e))?;

    Ok(Json(ResultResponse {
        result: reply.text_or(language.no_response_message()),
    }))
}
