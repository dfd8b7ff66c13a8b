//! Runtime configuration, read once at startup from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_GROQ_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_GROQ_PROBE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_PREDICTION_CONCURRENCY: usize = 8;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Hosted chat-completion predictor settings.
#[derive(Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
    pub temperature: f32,
}

impl core::fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("probe_timeout", &self.probe_timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_GROQ_API_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            timeout: Duration::from_millis(DEFAULT_GROQ_TIMEOUT_MS),
            probe_timeout: Duration::from_millis(DEFAULT_GROQ_PROBE_TIMEOUT_MS),
            temperature: 0.1,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Which predictor to run and how hard to fan out.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// `Some` selects the hosted predictor (with local fallback); `None` selects local only.
    pub groq: Option<GroqConfig>,
    pub max_concurrent_predictions: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            groq: None,
            max_concurrent_predictions: DEFAULT_PREDICTION_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres when set; in-memory store otherwise.
    pub database_url: Option<String>,
    /// JSON seed for the in-memory store.
    pub seed_file: Option<PathBuf>,
    pub predictor: PredictorConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let groq = match get("GROQ_API_KEY") {
            Some(api_key) => {
                let mut cfg = GroqConfig::new(api_key);
                if let Some(endpoint) = get("GROQ_API_URL") {
                    cfg.endpoint = endpoint;
                }
                if let Some(model) = get("GROQ_MODEL") {
                    cfg.model = model;
                }
                if let Some(ms) = get("GROQ_TIMEOUT_MS") {
                    cfg.timeout = Duration::from_millis(parse_positive("GROQ_TIMEOUT_MS", &ms)?);
                }
                if let Some(ms) = get("GROQ_PROBE_TIMEOUT_MS") {
                    cfg.probe_timeout =
                        Duration::from_millis(parse_positive("GROQ_PROBE_TIMEOUT_MS", &ms)?);
                }
                Some(cfg)
            }
            None => None,
        };

        let max_concurrent_predictions = match get("PREDICTION_CONCURRENCY") {
            Some(v) => parse_positive("PREDICTION_CONCURRENCY", &v)? as usize,
            None => DEFAULT_PREDICTION_CONCURRENCY,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: get("DATABASE_URL"),
            seed_file: get("SEED_FILE").map(PathBuf::from),
            predictor: PredictorConfig {
                groq,
                max_concurrent_predictions,
            },
        })
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
