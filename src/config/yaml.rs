//! YAML configuration file loading
//!
//! The file mirrors the `ServerConfig` fields with every entry optional, so a
//! YAML file only needs to name the settings it overrides.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 3100
//! stt:
//!   provider: groq
//!   model: whisper-large-v3-turbo
//! auth:
//!   required: true
//!   api_secrets:
//!     - id: ci
//!       secret: change-me
//! relay:
//!   max_in_flight: 8
//!   reorder_window: 64
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::{AuthApiSecret, ConfigError, ServerConfig, TlsConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct YamlConfig {
    #[serde(default)]
    server: YamlServer,
    #[serde(default)]
    stt: YamlStt,
    #[serde(default)]
    auth: YamlAuth,
    #[serde(default)]
    security: YamlSecurity,
    #[serde(default)]
    relay: YamlRelay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlServer {
    host: Option<String>,
    port: Option<u16>,
    tls_cert_path: Option<PathBuf>,
    tls_key_path: Option<PathBuf>,
    stream_idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlStt {
    provider: Option<String>,
    model: Option<String>,
    language: Option<String>,
    endpoint: Option<String>,
    openai_api_key: Option<String>,
    groq_api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlAuth {
    required: Option<bool>,
    api_secrets: Option<Vec<YamlApiSecret>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlApiSecret {
    id: String,
    secret: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlSecurity {
    cors_allowed_origins: Option<String>,
    rate_limit_requests_per_second: Option<u64>,
    rate_limit_burst_size: Option<u32>,
    max_websocket_connections: Option<usize>,
    max_connections_per_ip: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlRelay {
    max_in_flight: Option<usize>,
    reorder_window: Option<usize>,
    high_water_mark: Option<usize>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    global_max_in_flight: Option<usize>,
}

impl YamlConfig {
    pub(super) fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Apply the file's overrides on top of an already-loaded configuration.
    pub(super) fn apply(self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        if let Some(host) = self.server.host {
            config.host = host;
        }
        if let Some(port) = self.server.port {
            config.port = port;
        }
        match (self.server.tls_cert_path, self.server.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                config.tls = Some(TlsConfig {
                    cert_path,
                    key_path,
                });
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Validation(
                    "tls_cert_path and tls_key_path must be set together".to_string(),
                ));
            }
        }
        if let Some(secs) = self.server.stream_idle_timeout_secs {
            config.stream_idle_timeout = Duration::from_secs(secs);
        }

        if let Some(provider) = self.stt.provider {
            config.stt_provider = provider;
        }
        if self.stt.model.is_some() {
            config.stt_model = self.stt.model;
        }
        if self.stt.language.is_some() {
            config.stt_language = self.stt.language;
        }
        if self.stt.endpoint.is_some() {
            config.stt_endpoint = self.stt.endpoint;
        }
        if self.stt.openai_api_key.is_some() {
            config.openai_api_key = self.stt.openai_api_key;
        }
        if self.stt.groq_api_key.is_some() {
            config.groq_api_key = self.stt.groq_api_key;
        }

        if let Some(required) = self.auth.required {
            config.auth_required = required;
        }
        if let Some(secrets) = self.auth.api_secrets {
            config.auth_api_secrets = secrets
                .into_iter()
                .map(|s| AuthApiSecret {
                    id: s.id,
                    secret: s.secret,
                })
                .collect();
        }

        if self.security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = self.security.cors_allowed_origins;
        }
        if let Some(rps) = self.security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = self.security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
        if self.security.max_websocket_connections.is_some() {
            config.max_websocket_connections = self.security.max_websocket_connections;
        }
        if let Some(per_ip) = self.security.max_connections_per_ip {
            config.max_connections_per_ip = per_ip;
        }

        if let Some(m) = self.relay.max_in_flight {
            config.relay.max_in_flight = m;
        }
        if let Some(k) = self.relay.reorder_window {
            config.relay.reorder_window = k;
        }
        if self.relay.high_water_mark.is_some() {
            config.relay.high_water_mark = self.relay.high_water_mark;
        }
        if let Some(secs) = self.relay.request_timeout_secs {
            config.relay.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.relay.max_retries {
            config.relay.max_retries = retries;
        }
        if let Some(ms) = self.relay.retry_base_delay_ms {
            config.relay.retry_base_delay = Duration::from_millis(ms);
        }
        if self.relay.global_max_in_flight.is_some() {
            config.relay.global_max_in_flight = self.relay.global_max_in_flight;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn apply_yaml(yaml: &str, config: &mut ServerConfig) -> Result<(), ConfigError> {
        let parsed: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        parsed.apply(config)
    }

    #[test]
    fn test_empty_file_changes_nothing() {
        let mut config = ServerConfig::default();
        apply_yaml("{}", &mut config).unwrap();
        assert_eq!(config.port, ServerConfig::default().port);
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = ServerConfig::default();
        apply_yaml(
            r#"
server:
  port: 4000
stt:
  provider: groq
  groq_api_key: gsk-from-yaml
relay:
  max_in_flight: 8
  reorder_window: 16
"#,
            &mut config,
        )
        .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.stt_provider, "groq");
        assert_eq!(config.groq_api_key.as_deref(), Some("gsk-from-yaml"));
        assert_eq!(config.relay.max_in_flight, 8);
        assert_eq!(config.relay.reorder_window, 16);
        // Untouched fields keep their defaults
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_auth_secrets_from_yaml() {
        let mut config = ServerConfig::default();
        apply_yaml(
            r#"
auth:
  required: true
  api_secrets:
    - id: ci
      secret: token-one
"#,
            &mut config,
        )
        .unwrap();

        assert!(config.auth_required);
        assert_eq!(config.auth_api_secrets.len(), 1);
        assert_eq!(config.auth_api_secrets[0].id, "ci");
    }

    #[test]
    fn test_tls_paths_must_pair() {
        let mut config = ServerConfig::default();
        let result = apply_yaml(
            r#"
server:
  tls_cert_path: /tmp/cert.pem
"#,
            &mut config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<YamlConfig, _> = serde_yaml::from_str("bogus_section: 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 5000").unwrap();

        let yaml = YamlConfig::load(file.path()).unwrap();
        let mut config = ServerConfig::default();
        yaml.apply(&mut config).unwrap();
        assert_eq!(config.port, 5000);
    }
}
