//! Mock provider for tests and local runs without an API key.

use super::{GenerationRequest, ModelProvider, ModelReply, ProviderError, Usage};
use crate::models::Role;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Mock model provider.
///
/// Replies queued with [`MockProvider::push_reply`] / [`MockProvider::push_error`]
/// are returned in order; once the queue is empty it echoes the last user
/// text as `Mock response for: <text>`.
///
/// Requests are only kept when built [`MockProvider::with_recording`], so a
/// long-running mock server does not grow with traffic.
pub struct MockProvider {
    enabled: AtomicBool,
    failing: AtomicBool,
    delay: Option<Duration>,
    recording: bool,
    calls: AtomicUsize,
    scripted: Mutex<VecDeque<Result<ModelReply, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            failing: AtomicBool::new(false),
            delay: None,
            recording: false,
            calls: AtomicUsize::new(0),
            scripted: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Simulated latency applied to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Keep a copy of every request for [`MockProvider::requests`].
    pub fn with_recording(mut self) -> Self {
        self.recording = true;
        self
    }

    pub async fn push_reply(&self, reply: ModelReply) {
        self.scripted.lock().await.push_back(Ok(reply));
    }

    pub async fn push_error(&self, error: ProviderError) {
        self.scripted.lock().await.push_back(Err(error));
    }

    /// Make every unscripted call fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Number of `generate` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first. Always empty unless recording.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    fn echo(request: &GenerationRequest) -> ModelReply {
        let last_text = request
            .contents
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.parts.iter().rev().find_map(|p| p.as_text()))
            .unwrap_or_default();

        let mut reply = ModelReply::from_text(format!("Mock response for: {}", last_text));
        reply.usage = Usage {
            input_tokens: (last_text.len() / 4) as i32,
            output_tokens: 10,
        };
        reply
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.recording {
            self.requests.lock().await.push(request.clone());
        }

        if !self.enabled.load(Ordering::SeqCst) {
            return Err(ProviderError::NotConfigured(
                "Mock provider not enabled".to_string(),
            ));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(scripted) = self.scripted.lock().await.pop_front() {
            return scripted;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::NetworkError(
                "mock provider failure".to_string(),
            ));
        }

        Ok(Self::echo(request))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock provider not enabled".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Part;
    use crate::services::providers::{GenerationParams, Message};

    fn request(text: &str) -> GenerationRequest {
        GenerationRequest {
            model: "mock-model".to_string(),
            system_instruction: None,
            contents: vec![Message::user(vec![Part::text(text)])],
            params: GenerationParams::default(),
        }
    }

    #[tokio::test]
    async fn echoes_last_user_text() {
        let provider = MockProvider::default();
        let reply = provider.generate(&request("Sahiwal")).await.unwrap();

        assert_eq!(reply.text().as_deref(), Some("Mock response for: Sahiwal"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn scripted_replies_come_first() {
        let provider = MockProvider::default().with_recording();
        provider.push_reply(ModelReply::default()).await;
        provider
            .push_error(ProviderError::ApiError("boom".to_string()))
            .await;

        assert!(provider.generate(&request("a")).await.unwrap().text().is_none());
        assert!(provider.generate(&request("b")).await.is_err());
        assert!(provider.generate(&request("c")).await.is_ok());
        assert_eq!(provider.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn requests_are_not_kept_by_default() {
        let provider = MockProvider::default();
        for text in ["Gir", "Ongole", "Kangayam"] {
            provider.generate(&request(text)).await.unwrap();
        }

        assert_eq!(provider.calls(), 3);
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_provider_fails_health_check() {
        let provider = MockProvider::new(false);
        assert!(provider.health_check().await.is_err());
        assert!(provider.generate(&request("a")).await.is_err());
    }
}
