//! Model gateway: the only code that talks to the remote completion service.
//!
//! Handlers and the session registry depend on the [`ModelProvider`] trait so
//! the Gemini backend can be swapped for the mock in tests and local runs.

pub mod gemini;
pub mod mock;

use crate::models::{Part, Role};
use crate::services::metrics;
use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Short label used for the provider error metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Generation options forwarded with every request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_output_tokens: Option<i32>,
}

/// One authored block of content parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }
}

/// A complete call to the model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model name, e.g. `gemini-2.0-flash-exp`.
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Message>,
    pub params: GenerationParams,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other => "other",
        }
    }
}

/// One alternative answer from the model.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Text parts in order; non-text parts are dropped at the boundary.
    pub texts: Vec<String>,
    pub finish_reason: FinishReason,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: i32,
    pub output_tokens: i32,
}

/// Parsed model response.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub candidates: Vec<Candidate>,
    pub usage: Usage,
}

impl ModelReply {
    /// Reply carrying a single completed candidate with one text part.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                texts: vec![text.into()],
                finish_reason: FinishReason::Complete,
            }],
            usage: Usage::default(),
        }
    }

    /// All text parts of the first candidate, concatenated. `None` when
    /// there is no candidate or it carries no text.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate.texts.concat();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Text of the reply, or `fallback` when nothing could be extracted.
    pub fn text_or(&self, fallback: &str) -> String {
        self.text().unwrap_or_else(|| fallback.to_string())
    }

    pub fn finish_reason(&self) -> FinishReason {
        self.candidates
            .first()
            .map(|c| c.finish_reason)
            .unwrap_or(FinishReason::Other)
    }
}

/// Trait for text/image completion providers (e.g., Gemini).
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Generate a response for the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Call `provider` and record latency, token usage and errors for
/// `operation` (the endpoint or registry step issuing the call).
pub async fn generate_recorded(
    provider: &dyn ModelProvider,
    operation: &str,
    request: &GenerationRequest,
) -> Result<ModelReply, ProviderError> {
    let start = Instant::now();
    let result = provider.generate(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    metrics::record_provider_latency(provider.name(), &request.model, elapsed);

    match &result {
        Ok(reply) => {
            metrics::record_tokens(
                &request.model,
                reply.usage.input_tokens,
                reply.usage.output_tokens,
            );
            metrics::record_genai_request(operation, &request.model, reply.finish_reason().as_str());
            tracing::debug!(
                provider = provider.name(),
                operation,
                model = %request.model,
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                elapsed_secs = elapsed,
                "Model call completed"
            );
        }
        Err(e) => {
            metrics::record_provider_error(provider.name(), e.kind());
            tracing::warn!(
                provider = provider.name(),
                operation,
                model = %request.model,
                error = %e,
                "Model call failed"
            );
        }
    }

    result
}
