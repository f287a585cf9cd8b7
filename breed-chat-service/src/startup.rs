//! Application startup and lifecycle management.

use crate::config::{BreedChatConfig, ProviderKind};
use crate::handlers::{chat, generate, health};
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::providers::mock::MockProvider;
use crate::services::registry::{ChatSettings, SessionRegistry};
use crate::services::{http_metrics_middleware, prompt::CHAT_PERSONA, ModelProvider};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Base64 images inflate request bodies well past axum's 2 MB default.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BreedChatConfig>,
    pub provider: Arc<dyn ModelProvider>,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    /// Wire the session registry to `provider` using the chat settings from
    /// `config`.
    pub fn new(config: BreedChatConfig, provider: Arc<dyn ModelProvider>) -> Self {
        let registry = SessionRegistry::new(
            provider.clone(),
            ChatSettings {
                model: config.models.chat_model.clone(),
                seed_prompt: CHAT_PERSONA.to_string(),
                params: config.models.chat_params,
            },
            config.sessions.eviction_policy(),
        );

        Self {
            config: Arc::new(config),
            provider,
            registry: Arc::new(registry),
        }
    }
}

/// Construct the model provider selected by `GENAI_PROVIDER`.
pub fn build_provider(config: &BreedChatConfig) -> Result<Arc<dyn ModelProvider>, AppError> {
    match config.provider {
        ProviderKind::Gemini => {
            let gemini_config = GeminiConfig {
                timeout: config.google.request_timeout,
                ..GeminiConfig::new(config.google.api_key.clone())
            };
            let provider = GeminiProvider::new(gemini_config)
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            tracing::info!(
                text_model = %config.models.text_model,
                image_model = %config.models.image_model,
                chat_model = %config.models.chat_model,
                "Initialized Gemini provider"
            );
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => {
            tracing::warn!("Using mock model provider; replies are canned");
            Ok(Arc::new(MockProvider::default()))
        }
    }
}

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::index))
        .route("/image_to_text", post(generate::image_to_text))
        .route("/text_to_text", post(generate::text_to_text))
        .route("/text_to_text_chat", post(generate::text_to_text_chat))
        .route("/api/chatBreed", post(chat::chat_breed))
        .route("/api/new_chat", post(chat::new_chat))
        .route("/api/chat_history", get(chat::chat_history))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        // Route layer so the matched path is available as a label
        .route_layer(from_fn(http_metrics_middleware))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| make_request_span(request),
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BreedChatConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config)?;
        Self::build_with_provider(config, provider).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: BreedChatConfig,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let address = config.common.bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let state = AppState::new(config, provider);
        let policy = state.registry.policy();
        tracing::info!(
            port,
            provider = state.provider.name(),
            max_sessions = ?policy.max_sessions,
            idle_ttl = ?policy.idle_ttl,
            "Breed chat service listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
