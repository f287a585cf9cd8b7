//! Integration tests for the one-shot generation endpoints.

mod common;

use axum::http::StatusCode;
use breed_chat_service::models::Part;
use breed_chat_service::services::prompt::{CHAT_PERSONA, DEFAULT_IMAGE_PROMPT, IMAGE_PERSONA, TEXT_PERSONA};
use breed_chat_service::services::providers::{ModelReply, ProviderError};
use breed_chat_service::services::Language;
use common::{test_app, PNG_BASE64};
use serde_json::json;

#[tokio::test]
async fn image_to_text_requires_image() {
    let app = test_app();

    let (status, body) = app
        .post_json("/image_to_text", json!({ "prompt": "Is this cow healthy?" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Image (base64 encoded) is required");
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn image_to_text_sends_persona_image_and_localized_prompt() {
    let app = test_app();
    app.provider
        .push_reply(ModelReply::from_text("No visible lesions."))
        .await;

    let (status, body) = app
        .post_json(
            "/image_to_text",
            json!({ "image_base64": PNG_BASE64, "prompt": "Check the skin", "language": "hi" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "No visible lesions.");

    let requests = app.provider.requests().await;
    assert_eq!(requests.len(), 1);
    let parts = &requests[0].contents[0].parts;
    assert_eq!(parts[0], Part::text(IMAGE_PERSONA));
    assert!(matches!(&parts[1], Part::Image { mime_type, .. } if mime_type == "image/png"));
    assert_eq!(parts[2], Part::text(Language::Hindi.wrap_prompt("Check the skin")));
    assert_eq!(requests[0].params.max_output_tokens, Some(172));
}

#[tokio::test]
async fn image_to_text_uses_default_prompt() {
    let app = test_app();

    let (status, _) = app
        .post_json("/image_to_text", json!({ "image_base64": PNG_BASE64 }))
        .await;

    assert_eq!(status, StatusCode::OK);
    let requests = app.provider.requests().await;
    assert_eq!(
        requests[0].contents[0].parts[2],
        Part::text(Language::English.wrap_prompt(DEFAULT_IMAGE_PROMPT))
    );
}

#[tokio::test]
async fn image_to_text_invalid_base64_is_server_error() {
    let app = test_app();

    let (status, body) = app
        .post_json("/image_to_text", json!({ "image_base64": "%%%not-base64%%%" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], Language::English.error_message());
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn zero_candidates_return_localized_placeholder() {
    let app = test_app();
    app.provider.push_reply(ModelReply::default()).await;

    let (status, body) = app
        .post_json(
            "/image_to_text",
            json!({ "image_base64": PNG_BASE64, "language": "ta" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], Language::Tamil.no_response_message());
}

#[tokio::test]
async fn unknown_language_falls_back_to_english() {
    let app = test_app();
    app.provider
        .push_error(ProviderError::NetworkError("connection reset".to_string()))
        .await;

    let (status, body) = app
        .post_json(
            "/image_to_text",
            json!({ "image_base64": PNG_BASE64, "language": "xx" }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], Language::English.error_message());
    assert!(!body["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn text_to_text_prefixes_persona() {
    let app = test_app();

    let (status, body) = app
        .post_json("/text_to_text", json!({ "prompt": "What is A2 milk?" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["result"].as_str().unwrap().ends_with("What is A2 milk?"));

    let requests = app.provider.requests().await;
    let text = requests[0].contents[0].parts[0].as_text().unwrap().to_string();
    assert!(text.starts_with(TEXT_PERSONA));
    assert!(text.ends_with("\n\nUser: What is A2 milk?"));
    assert_eq!(requests[0].params.max_output_tokens, Some(250));
}

#[tokio::test]
async fn text_to_text_accepts_missing_prompt() {
    let app = test_app();

    let (status, _) = app.post_json("/text_to_text", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn text_to_text_gateway_failure_is_generic_error() {
    let app = test_app();
    app.provider.set_failing(true);

    let (status, body) = app
        .post_json("/text_to_text", json!({ "prompt": "Gir" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], Language::English.error_message());
}

#[tokio::test]
async fn text_to_text_chat_sends_prompt_once_with_persona() {
    let app = test_app();

    let (status, body) = app
        .post_json("/text_to_text_chat", json!({ "prompt": "Best breed for Rajasthan?" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Mock response for: Best breed for Rajasthan?");
    assert_eq!(app.provider.calls(), 1);

    let requests = app.provider.requests().await;
    assert_eq!(requests[0].system_instruction.as_deref(), Some(CHAT_PERSONA));
    assert_eq!(requests[0].contents.len(), 1);
    assert!(app.state.registry.is_empty().await);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/text_to_text")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{oops"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_image_body_is_payload_too_large() {
    let app = test_app();
    let image = "A".repeat(21 * 1024 * 1024);

    let (status, body) = app
        .post_json("/image_to_text", json!({ "image": image }))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("too large"));
    assert_eq!(app.provider.calls(), 0);
}
