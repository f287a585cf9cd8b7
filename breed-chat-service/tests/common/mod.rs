//! Shared helpers for breed-chat-service integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use breed_chat_service::config::BreedChatConfig;
use breed_chat_service::services::providers::mock::MockProvider;
use breed_chat_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub provider: Arc<MockProvider>,
    pub state: AppState,
}

pub fn test_app() -> TestApp {
    test_app_with(BreedChatConfig::for_mock())
}

pub fn test_app_with(config: BreedChatConfig) -> TestApp {
    let provider = Arc::new(MockProvider::default().with_recording());
    let state = AppState::new(config, provider.clone());
    TestApp {
        router: build_router(state.clone()),
        provider,
        state,
    }
}

impl TestApp {
    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

/// Smallest valid PNG signature, base64-encoded.
pub const PNG_BASE64: &str = "iVBORw0KGgo=";
