//! Configuration module for the Scribe Relay server
//!
//! Configuration is assembled from several sources with the priority
//! YAML file > environment variables > `.env` values > defaults. The `.env`
//! file is loaded by `main` before any of this code runs, so here "environment"
//! covers both.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

mod yaml;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// API secret authentication entry with a client identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthApiSecret {
    pub id: String,
    pub secret: String,
}

/// Tunables for the per-connection transcription pipeline.
///
/// `max_in_flight` and `reorder_window` are deliberately configuration rather
/// than constants: deployments trade provider quota against latency very
/// differently, and the conservative defaults here favor predictable memory
/// use over throughput.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum concurrently in-flight provider calls per connection (M)
    pub max_in_flight: usize,
    /// Maximum buffered out-of-order results per connection (K)
    pub reorder_window: usize,
    /// Pause inbound reads once this many chunks are admitted but not yet
    /// emitted. Defaults to `max_in_flight + reorder_window` when unset.
    pub high_water_mark: Option<usize>,
    /// Timeout applied to each individual provider call (T)
    pub request_timeout: Duration,
    /// Retries after the initial attempt for transient failures (R)
    pub max_retries: u32,
    /// Base delay for exponential retry backoff
    pub retry_base_delay: Duration,
    /// Optional process-wide cap on in-flight provider calls, shared by all
    /// connections against the provider quota
    pub global_max_in_flight: Option<usize>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            reorder_window: 32,
            high_water_mark: None,
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(250),
            global_max_in_flight: None,
        }
    }
}

impl RelayConfig {
    /// Effective intake high-water mark.
    pub fn high_water(&self) -> usize {
        self.high_water_mark
            .unwrap_or(self.max_in_flight + self.reorder_window)
    }
}

/// Server configuration
///
/// Contains everything needed to run the relay server:
/// - Server settings (host, port, TLS)
/// - Speech-to-text provider selection and API keys
/// - Authentication settings (API secrets)
/// - Security settings (CORS, rate limiting, connection limits)
/// - Relay pipeline tunables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Speech-to-text provider selection
    /// Provider name ("openai" or "groq")
    pub stt_provider: String,
    /// Model identifier passed to the provider; provider default when unset
    pub stt_model: Option<String>,
    /// Transcription language hint (e.g. "en")
    pub stt_language: Option<String>,
    /// Override for the provider endpoint URL (self-hosted gateways, tests)
    pub stt_endpoint: Option<String>,

    // Provider API keys
    /// OpenAI API key for Whisper transcription
    pub openai_api_key: Option<String>,
    /// Groq API key for the Whisper-compatible endpoint
    pub groq_api_key: Option<String>,

    // Authentication configuration
    pub auth_api_secrets: Vec<AuthApiSecret>,
    pub auth_required: bool,

    // Security configuration
    /// Comma-separated allowed origins, "*" for any, None for same-origin only
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u64,
    pub rate_limit_burst_size: u32,
    /// Global cap on concurrent WebSocket connections (None = unlimited)
    pub max_websocket_connections: Option<usize>,
    pub max_connections_per_ip: usize,

    /// Close streaming connections with no inbound traffic for this long
    pub stream_idle_timeout: Duration,

    // Relay pipeline tunables
    pub relay: RelayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3100,
            tls: None,
            stt_provider: "openai".to_string(),
            stt_model: None,
            stt_language: None,
            stt_endpoint: None,
            openai_api_key: None,
            groq_api_key: None,
            auth_api_secrets: Vec::new(),
            auth_required: false,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            max_websocket_connections: None,
            max_connections_per_ip: 8,
            stream_idle_timeout: Duration::from_secs(300),
            relay: RelayConfig::default(),
        }
    }
}

/// Errors produced while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Read and parse an environment variable, erroring on unparseable values
/// rather than silently falling back to a default.
fn env_parse<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        _ => Ok(None),
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parse the `AUTH_API_SECRETS` format: `id1:secret1,id2:secret2`.
fn parse_api_secrets(raw: &str) -> Result<Vec<AuthApiSecret>, ConfigError> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (id, secret) = entry
                .trim()
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: "AUTH_API_SECRETS",
                    value: entry.to_string(),
                })?;
            if id.is_empty() || secret.is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: "AUTH_API_SECRETS",
                    value: entry.to_string(),
                });
            }
            Ok(AuthApiSecret {
                id: id.to_string(),
                secret: secret.to_string(),
            })
        })
        .collect()
}

impl ServerConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::load_env_layer()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables as the
    /// base layer. Validation runs once, after the YAML overrides are applied.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_env_layer()?;
        let yaml = yaml::YamlConfig::load(path)?;
        yaml.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn load_env_layer() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = env_string("HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse::<u16>("PORT")? {
            config.port = port;
        }

        let cert = env_string("TLS_CERT_PATH");
        let key = env_string("TLS_KEY_PATH");
        if let (Some(cert), Some(key)) = (cert, key) {
            config.tls = Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            });
        }

        if let Some(provider) = env_string("STT_PROVIDER") {
            config.stt_provider = provider;
        }
        config.stt_model = env_string("STT_MODEL");
        config.stt_language = env_string("STT_LANGUAGE");
        config.stt_endpoint = env_string("STT_ENDPOINT");
        config.openai_api_key = env_string("OPENAI_API_KEY");
        config.groq_api_key = env_string("GROQ_API_KEY");

        if let Some(raw) = env_string("AUTH_API_SECRETS") {
            config.auth_api_secrets = parse_api_secrets(&raw)?;
        }
        if let Some(required) = env_parse::<bool>("AUTH_REQUIRED")? {
            config.auth_required = required;
        }

        config.cors_allowed_origins = env_string("CORS_ALLOWED_ORIGINS");
        if let Some(rps) = env_parse::<u64>("RATE_LIMIT_RPS")? {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = env_parse::<u32>("RATE_LIMIT_BURST")? {
            config.rate_limit_burst_size = burst;
        }
        config.max_websocket_connections = env_parse::<usize>("MAX_WEBSOCKET_CONNECTIONS")?;
        if let Some(per_ip) = env_parse::<usize>("MAX_CONNECTIONS_PER_IP")? {
            config.max_connections_per_ip = per_ip;
        }
        if let Some(secs) = env_parse::<u64>("STREAM_IDLE_TIMEOUT_SECS")? {
            config.stream_idle_timeout = Duration::from_secs(secs);
        }

        if let Some(m) = env_parse::<usize>("RELAY_MAX_IN_FLIGHT")? {
            config.relay.max_in_flight = m;
        }
        if let Some(k) = env_parse::<usize>("RELAY_REORDER_WINDOW")? {
            config.relay.reorder_window = k;
        }
        config.relay.high_water_mark = env_parse::<usize>("RELAY_HIGH_WATER_MARK")?;
        if let Some(secs) = env_parse::<u64>("RELAY_REQUEST_TIMEOUT_SECS")? {
            config.relay.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_parse::<u32>("RELAY_MAX_RETRIES")? {
            config.relay.max_retries = retries;
        }
        if let Some(ms) = env_parse::<u64>("RELAY_RETRY_BASE_DELAY_MS")? {
            config.relay.retry_base_delay = Duration::from_millis(ms);
        }
        config.relay.global_max_in_flight = env_parse::<usize>("RELAY_GLOBAL_MAX_IN_FLIGHT")?;

        Ok(config)
    }

    /// Socket address string the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn has_api_secret_auth(&self) -> bool {
        !self.auth_api_secrets.is_empty()
    }

    /// API key for the configured provider.
    pub fn provider_api_key(&self) -> Option<&str> {
        match self.stt_provider.as_str() {
            "groq" => self.groq_api_key.as_deref(),
            _ => self.openai_api_key.as_deref(),
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_required && !self.has_api_secret_auth() {
            return Err(ConfigError::Validation(
                "AUTH_REQUIRED is set but no API secrets are configured".to_string(),
            ));
        }
        if self.provider_api_key().is_none() {
            return Err(ConfigError::Validation(format!(
                "no API key configured for STT provider '{}'",
                self.stt_provider
            )));
        }
        if self.relay.max_in_flight == 0 {
            return Err(ConfigError::Validation(
                "RELAY_MAX_IN_FLIGHT must be at least 1".to_string(),
            ));
        }
        if self.relay.reorder_window == 0 {
            return Err(ConfigError::Validation(
                "RELAY_REORDER_WINDOW must be at least 1".to_string(),
            ));
        }
        if self.max_connections_per_ip == 0 {
            return Err(ConfigError::Validation(
                "MAX_CONNECTIONS_PER_IP must be at least 1".to_string(),
            ));
        }
        if let Some(global) = self.relay.global_max_in_flight
            && global < self.relay.max_in_flight
        {
            return Err(ConfigError::Validation(
                "RELAY_GLOBAL_MAX_IN_FLIGHT must not be smaller than RELAY_MAX_IN_FLIGHT"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_relay_tunables() {
        let relay = RelayConfig::default();
        assert_eq!(relay.max_in_flight, 4);
        assert_eq!(relay.reorder_window, 32);
        assert_eq!(relay.high_water(), 36);
        assert_eq!(relay.request_timeout, Duration::from_secs(30));
        assert_eq!(relay.max_retries, 2);
    }

    #[test]
    fn test_high_water_override() {
        let relay = RelayConfig {
            high_water_mark: Some(10),
            ..Default::default()
        };
        assert_eq!(relay.high_water(), 10);
    }

    #[test]
    fn test_validate_requires_provider_key() {
        let config = ServerConfig::default();
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_groq_key_selected_by_provider() {
        let config = ServerConfig {
            stt_provider: "groq".to_string(),
            groq_api_key: Some("gsk-test".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = ServerConfig {
            stt_provider: "groq".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_auth_required_needs_secrets() {
        let config = ServerConfig {
            auth_required: true,
            ..valid_config()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            auth_required: true,
            auth_api_secrets: vec![AuthApiSecret {
                id: "ci".to_string(),
                secret: "token".to_string(),
            }],
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_global_cap_not_below_local() {
        let mut config = valid_config();
        config.relay.global_max_in_flight = Some(2);
        config.relay.max_in_flight = 4;
        assert!(config.validate().is_err());

        config.relay.global_max_in_flight = Some(16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_api_secrets() {
        let secrets = parse_api_secrets("a:one,b:two").unwrap();
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].id, "a");
        assert_eq!(secrets[1].secret, "two");

        assert!(parse_api_secrets("no-colon").is_err());
        assert!(parse_api_secrets(":empty-id").is_err());
        assert!(parse_api_secrets("").unwrap().is_empty());
    }

    #[test]
    fn test_address_format() {
        let config = valid_config();
        assert_eq!(config.address(), "0.0.0.0:3100");
    }
}
