use crate::services::providers::GenerationParams;
use crate::services::EvictionPolicy;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TEXT_MAX_TOKENS: i32 = 250;
const DEFAULT_IMAGE_MAX_TOKENS: i32 = 172;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SESSION_MAX_ENTRIES: usize = 10_000;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct BreedChatConfig {
    pub common: core_config::Config,
    pub environment: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub provider: ProviderKind,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub sessions: SessionConfig,
}

/// Which model backend the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    /// Canned replies, for local runs and tests without an API key.
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_PROVIDER must be 'gemini' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Empty when no key is set; only the Gemini provider requires one.
    pub api_key: Secret<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub text_model: String,
    pub image_model: String,
    pub chat_model: String,
    pub text_params: GenerationParams,
    pub image_params: GenerationParams,
    pub chat_params: GenerationParams,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Zero disables the cap.
    pub max_entries: usize,
    /// Zero disables idle expiry.
    pub idle_ttl_secs: u64,
}

impl SessionConfig {
    pub fn eviction_policy(&self) -> EvictionPolicy {
        let policy = EvictionPolicy::unbounded().with_max_sessions(self.max_entries);
        if self.idle_ttl_secs == 0 {
            policy
        } else {
            policy.with_idle_ttl(Duration::from_secs(self.idle_ttl_secs))
        }
    }
}

impl BreedChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let is_prod = environment == "prod";

        let provider: ProviderKind = get_env("GENAI_PROVIDER", Some("gemini"), false)?.parse()?;

        let api_key = env::var("GOOGLE_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .unwrap_or_default();
        if provider == ProviderKind::Gemini && api_key.is_empty() && is_prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GOOGLE_API_KEY is required in production but not set"
            )));
        }

        let temperature = parse_env("GENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        let chat_max_tokens = match env::var("GENAI_CHAT_MAX_TOKENS") {
            Ok(val) => Some(parse_value::<i32>("GENAI_CHAT_MAX_TOKENS", &val)?),
            Err(_) => None,
        };

        Ok(BreedChatConfig {
            common,
            environment,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            provider,
            google: GoogleConfig {
                api_key: Secret::new(api_key),
                request_timeout: Duration::from_secs(parse_env(
                    "GENAI_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?),
            },
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                image_model: get_env("GENAI_IMAGE_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                chat_model: get_env("GENAI_CHAT_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                text_params: GenerationParams {
                    temperature: Some(temperature),
                    max_output_tokens: Some(parse_env(
                        "GENAI_TEXT_MAX_TOKENS",
                        DEFAULT_TEXT_MAX_TOKENS,
                    )?),
                },
                image_params: GenerationParams {
                    temperature: Some(temperature),
                    max_output_tokens: Some(parse_env(
                        "GENAI_IMAGE_MAX_TOKENS",
                        DEFAULT_IMAGE_MAX_TOKENS,
                    )?),
                },
                chat_params: GenerationParams {
                    temperature: Some(temperature),
                    max_output_tokens: chat_max_tokens,
                },
            },
            sessions: SessionConfig {
                max_entries: parse_env("SESSION_MAX_ENTRIES", DEFAULT_SESSION_MAX_ENTRIES)?,
                idle_ttl_secs: parse_env("SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS)?,
            },
        })
    }

    /// Settings for running the service against the mock provider, without
    /// touching the process environment.
    pub fn for_mock() -> Self {
        let params = |max| GenerationParams {
            temperature: Some(DEFAULT_TEMPERATURE),
            max_output_tokens: max,
        };

        BreedChatConfig {
            common: core_config::Config {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            environment: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            provider: ProviderKind::Mock,
            google: GoogleConfig {
                api_key: Secret::new(String::new()),
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            models: ModelConfig {
                text_model: DEFAULT_MODEL.to_string(),
                image_model: DEFAULT_MODEL.to_string(),
                chat_model: DEFAULT_MODEL.to_string(),
                text_params: params(Some(DEFAULT_TEXT_MAX_TOKENS)),
                image_params: params(Some(DEFAULT_IMAGE_MAX_TOKENS)),
                chat_params: params(None),
            },
            sessions: SessionConfig {
                max_entries: DEFAULT_SESSION_MAX_ENTRIES,
                idle_ttl_secs: DEFAULT_SESSION_IDLE_TTL_SECS,
            },
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod && default.is_none() {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(val) => parse_value(key, &val),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, val: &str) -> Result<T, AppError> {
    val.trim()
        .parse()
        .map_err(|_| AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}'", key, val)))
}
