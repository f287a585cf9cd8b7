use breed_chat_service::config::BreedChatConfig;
use breed_chat_service::services::init_metrics;
use breed_chat_service::startup::Application;
use service_core::observability::init_tracing;

const SERVICE_NAME: &str = "breed-chat-service";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = BreedChatConfig::load();

    // Tracing settings come from the config; fall back so a load failure
    // is still logged.
    let (log_level, otlp_endpoint) = match &config {
        Ok(config) => (config.log_level.clone(), config.otlp_endpoint.clone()),
        Err(_) => ("info".to_string(), None),
    };
    init_tracing(SERVICE_NAME, &log_level, otlp_endpoint.as_deref());

    let config = config.map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_metrics();

    let service_span = tracing::info_span!(
        "service",
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
    );
    let _guard = service_span.enter();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
