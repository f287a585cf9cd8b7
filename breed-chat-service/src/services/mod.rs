pub mod localization;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod registry;

pub use localization::Language;
pub use metrics::{get_metrics, http_metrics_middleware, init_metrics};
pub use providers::{ModelProvider, ModelReply, ProviderError};
pub use registry::{ChatSettings, EvictionPolicy, RegistryError, SessionRegistry, SharedConversation};
