//! Shared application state
//!
//! One `AppState` exists per process, shared by every route and connection.
//! It owns the configuration, the session registry, the provider adapter
//! (shared and stateless), the optional process-wide admission pool, and the
//! WebSocket connection accounting used by the connection-limit middleware.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::session::SessionRegistry;
use crate::core::stt::{SttConfig, SttError, Transcriber, create_transcriber};

/// Why a connection slot could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    GlobalLimitReached,
    PerIpLimitReached,
}

/// Process-wide shared state.
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: SessionRegistry,
    /// Stateless provider adapter, shared by all connections
    pub transcriber: Arc<dyn Transcriber>,
    /// Optional process-wide cap on in-flight provider calls
    pub global_permits: Option<Arc<Semaphore>>,

    // WebSocket connection accounting
    ws_connections: AtomicUsize,
    per_ip_connections: DashMap<IpAddr, usize>,
}

impl AppState {
    /// Build state from configuration, constructing the provider adapter.
    pub fn new(config: ServerConfig) -> Result<Self, SttError> {
        let stt_config = SttConfig {
            api_key: config
                .provider_api_key()
                .ok_or_else(|| {
                    SttError::Configuration(format!(
                        "no API key configured for STT provider '{}'",
                        config.stt_provider
                    ))
                })?
                .to_string(),
            model: config.stt_model.clone().unwrap_or_default(),
            language: config.stt_language.clone().unwrap_or_default(),
            endpoint: config.stt_endpoint.clone(),
        };
        let transcriber = create_transcriber(&config.stt_provider, stt_config)?;
        info!(
            provider = %config.stt_provider,
            info = transcriber.provider_info(),
            "transcription provider ready"
        );

        let global_permits = config
            .relay
            .global_max_in_flight
            .map(|n| Arc::new(Semaphore::new(n)));

        Ok(Self {
            config,
            sessions: SessionRegistry::new(),
            transcriber,
            global_permits,
            ws_connections: AtomicUsize::new(0),
            per_ip_connections: DashMap::new(),
        })
    }

    /// Try to reserve a WebSocket connection slot for the given client IP.
    ///
    /// Checks the global cap first, then the per-IP cap, rolling the global
    /// reservation back if the per-IP check fails. Callers must pair a
    /// successful acquire with exactly one `release_connection`.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        if let Some(max) = self.config.max_websocket_connections {
            let mut current = self.ws_connections.load(Ordering::Acquire);
            loop {
                if current >= max {
                    return Err(ConnectionLimitError::GlobalLimitReached);
                }
                match self.ws_connections.compare_exchange_weak(
                    current,
                    current + 1,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => break,
                    Err(actual) => current = actual,
                }
            }
        } else {
            self.ws_connections.fetch_add(1, Ordering::AcqRel);
        }

        let mut entry = self.per_ip_connections.entry(ip).or_insert(0);
        if *entry >= self.config.max_connections_per_ip {
            drop(entry);
            self.ws_connections.fetch_sub(1, Ordering::AcqRel);
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *entry += 1;
        Ok(())
    }

    /// Release a previously acquired connection slot.
    pub fn release_connection(&self, ip: IpAddr) {
        self.ws_connections.fetch_sub(1, Ordering::AcqRel);
        if let Some(mut entry) = self.per_ip_connections.get_mut(&ip) {
            *entry = entry.saturating_sub(1);
            let now_zero = *entry == 0;
            drop(entry);
            if now_zero {
                // Keep the map from accumulating one entry per IP ever seen
                self.per_ip_connections.remove_if(&ip, |_, count| *count == 0);
            }
        }
    }

    /// Current number of live WebSocket connections.
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Acquire)
    }

    /// Current number of live connections from one IP.
    pub fn ip_connection_count(&self, ip: &IpAddr) -> usize {
        self.per_ip_connections
            .get(ip)
            .map(|entry| *entry)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn test_state(max_global: Option<usize>, max_per_ip: usize) -> AppState {
        let config = ServerConfig {
            openai_api_key: Some("sk-test".to_string()),
            max_websocket_connections: max_global,
            max_connections_per_ip: max_per_ip,
            ..Default::default()
        };
        AppState::new(config).unwrap()
    }

    #[test]
    fn test_new_requires_provider_key() {
        let result = AppState::new(ServerConfig::default());
        assert!(matches!(result, Err(SttError::Configuration(_))));
    }

    #[test]
    fn test_per_ip_limit() {
        let state = test_state(Some(10), 3);
        let ip: IpAddr = Ipv4Addr::new(192, 168, 1, 100).into();

        assert_eq!(state.ws_connection_count(), 0);
        for _ in 0..3 {
            assert!(state.try_acquire_connection(ip).is_ok());
        }
        assert_eq!(state.ws_connection_count(), 3);
        assert_eq!(state.ip_connection_count(&ip), 3);

        assert_eq!(
            state.try_acquire_connection(ip),
            Err(ConnectionLimitError::PerIpLimitReached)
        );
        // The failed attempt must not leak a global slot
        assert_eq!(state.ws_connection_count(), 3);

        state.release_connection(ip);
        assert!(state.try_acquire_connection(ip).is_ok());
    }

    #[test]
    fn test_global_limit() {
        let state = test_state(Some(5), 10);
        let ips: Vec<IpAddr> = (1..=6)
            .map(|i| Ipv4Addr::new(10, 0, 0, i).into())
            .collect();

        for ip in &ips[0..5] {
            assert!(state.try_acquire_connection(*ip).is_ok());
        }
        assert_eq!(
            state.try_acquire_connection(ips[5]),
            Err(ConnectionLimitError::GlobalLimitReached)
        );

        state.release_connection(ips[0]);
        assert!(state.try_acquire_connection(ips[5]).is_ok());
    }

    #[test]
    fn test_release_cleans_up_ip_entries() {
        let state = test_state(None, 4);
        let ip: IpAddr = Ipv4Addr::new(172, 16, 0, 1).into();

        state.try_acquire_connection(ip).unwrap();
        state.release_connection(ip);
        assert_eq!(state.ip_connection_count(&ip), 0);
        assert_eq!(state.ws_connection_count(), 0);
    }

    #[test]
    fn test_global_permits_from_config() {
        let mut config = ServerConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        config.relay.global_max_in_flight = Some(16);
        let state = AppState::new(config).unwrap();
        let permits = state.global_permits.expect("global pool configured");
        assert_eq!(permits.available_permits(), 16);

        let state = test_state(None, 4);
        assert!(state.global_permits.is_none());
    }
}
