//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the groups injector.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream application every request is relayed to.
    pub upstream: UpstreamConfig,

    /// Identity API used to resolve bearer tokens into groups.
    pub identity: IdentityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., ":8080" or "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ":8080".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Bind address with an empty host expanded to all interfaces.
    ///
    /// `":8080"` becomes `"0.0.0.0:8080"`; anything else is returned as is.
    pub fn normalized_address(&self) -> String {
        match self.bind_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.bind_address.clone(),
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the upstream (e.g., "http://localhost:3000").
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
        }
    }
}

/// Identity API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity API server.
    pub api_url: String,

    /// PEM bundle trusted when verifying the identity API certificate.
    pub ca_cert_path: Option<String>,

    /// Skip certificate verification entirely. Only for in-cluster setups
    /// without a mounted CA bundle.
    pub insecure_skip_verify: bool,

    /// Per-lookup timeout in seconds (0 disables the timeout).
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_url: "https://kubernetes.default.svc".to_string(),
            ca_cert_path: None,
            insecure_skip_verify: false,
            timeout_secs: 10,
        }
    }
}

/// Timeout configuration for upstream forwarding.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the upstream to return response headers, in
    /// seconds (0 disables the timeout).
    pub upstream_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus endpoint bind address. Metrics are disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ProxyConfig::default();
        assert_eq!(config.upstream.url, "http://localhost:3000");
        assert_eq!(config.listener.bind_address, ":8080");
        assert_eq!(config.identity.api_url, "https://kubernetes.default.svc");
        assert!(!config.identity.insecure_skip_verify);
        assert_eq!(config.timeouts.upstream_secs, 0);
        assert!(config.observability.metrics_address.is_none());
    }

    #[test]
    fn test_normalized_address() {
        let mut listener = ListenerConfig::default();
        assert_eq!(listener.normalized_address(), "0.0.0.0:8080");

        listener.bind_address = "127.0.0.1:9000".to_string();
        assert_eq!(listener.normalized_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            url = "http://app:8000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.url, "http://app:8000");
        assert_eq!(config.listener.bind_address, ":8080");
        assert_eq!(config.identity.timeout_secs, 10);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
