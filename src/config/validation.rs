//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that upstream and identity URLs are usable
//! - Check the listen address carries a port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream URL '{url}' is invalid: {reason}")]
    UpstreamUrl { url: String, reason: String },

    #[error("identity API URL '{url}' is invalid: {reason}")]
    IdentityUrl { url: String, reason: String },

    #[error("listen address '{0}' must be of the form [host]:port")]
    ListenAddress(String),

    #[error("identity CA file '{0}' does not exist")]
    CaFileMissing(String),

    #[error("metrics address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(reason) = check_url(&config.upstream.url, &["http", "https"]) {
        errors.push(ValidationError::UpstreamUrl {
            url: config.upstream.url.clone(),
            reason,
        });
    }

    if let Err(reason) = check_url(&config.identity.api_url, &["http", "https"]) {
        errors.push(ValidationError::IdentityUrl {
            url: config.identity.api_url.clone(),
            reason,
        });
    }

    if !has_port(&config.listener.bind_address) {
        errors.push(ValidationError::ListenAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(path) = &config.identity.ca_cert_path {
        if !Path::new(path).is_file() {
            errors.push(ValidationError::CaFileMissing(path.clone()));
        }
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(raw: &str, schemes: &[&str]) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !schemes.contains(&url.scheme()) {
        return Err(format!(
            "scheme '{}' not supported (expected {})",
            url.scheme(),
            schemes.join(" or ")
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

fn has_port(addr: &str) -> bool {
    addr.rsplit_once(':')
        .map(|(_, port)| port.parse::<u16>().is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_malformed_upstream_rejected() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "not a url".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::UpstreamUrl { .. }));
    }

    #[test]
    fn test_https_upstream_accepted() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "https://app.internal:8443".to_string();
        assert!(validate_config(&config).is_ok());

        config.upstream.url = "ws://app.internal".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("scheme 'ws'"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "ftp://files".to_string();
        config.identity.api_url = "::".to_string();
        config.listener.bind_address = "localhost".to_string();
        config.identity.ca_cert_path = Some("/definitely/not/here.pem".to_string());
        config.observability.metrics_address = Some("nope".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_metrics_address_must_be_socket_addr() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = Some("0.0.0.0:9090".to_string());
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_address = Some(":9090".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::MetricsAddress(_)));
    }

    #[test]
    fn test_listen_address_forms() {
        assert!(has_port(":8080"));
        assert!(has_port("127.0.0.1:8080"));
        assert!(has_port("[::1]:8080"));
        assert!(!has_port("8080"));
        assert!(!has_port("host:http"));
    }
}
