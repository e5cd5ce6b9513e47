//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use clap::Args;
use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Settings taken from command-line flags or environment variables.
///
/// Every field is optional; only values that are present and non-empty
/// replace what the file (or the defaults) provide.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Upstream application base URL.
    #[arg(long, env = "UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Address to listen on (e.g. ":8080").
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Identity API base URL.
    #[arg(long, env = "OPENSHIFT_API_URL")]
    pub openshift_api_url: Option<String>,

    /// PEM bundle used to verify the identity API certificate.
    #[arg(long, env = "OPENSHIFT_CA_FILE")]
    pub openshift_ca_file: Option<String>,

    /// Disable certificate verification towards the identity API.
    #[arg(long, env = "OPENSHIFT_INSECURE_SKIP_VERIFY")]
    pub openshift_insecure_skip_verify: Option<bool>,

    /// Identity lookup timeout in seconds (0 disables).
    #[arg(long, env = "IDENTITY_TIMEOUT_SECS")]
    pub identity_timeout_secs: Option<u64>,

    /// Upstream response timeout in seconds (0 disables).
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Default log level when RUST_LOG is not set.
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format (pretty or json).
    #[arg(long, env = "LOG_FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Prometheus endpoint address; metrics are off when unset.
    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<String>,
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    match raw.to_ascii_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("unknown log format '{}'", other)),
    }
}

impl ConfigOverrides {
    /// Apply every present override onto `config`.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(url) = non_empty(&self.upstream_url) {
            config.upstream.url = url;
        }
        if let Some(addr) = non_empty(&self.listen_addr) {
            config.listener.bind_address = addr;
        }
        if let Some(url) = non_empty(&self.openshift_api_url) {
            config.identity.api_url = url;
        }
        if let Some(path) = non_empty(&self.openshift_ca_file) {
            config.identity.ca_cert_path = Some(path);
        }
        if let Some(skip) = self.openshift_insecure_skip_verify {
            config.identity.insecure_skip_verify = skip;
        }
        if let Some(secs) = self.identity_timeout_secs {
            config.identity.timeout_secs = secs;
        }
        if let Some(secs) = self.upstream_timeout_secs {
            config.timeouts.upstream_secs = secs;
        }
        if let Some(level) = non_empty(&self.log_level) {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(addr) = non_empty(&self.metrics_addr) {
            config.observability.metrics_address = Some(addr);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// Load configuration from an optional TOML file plus overrides, then
/// validate it.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_overrides_replace_defaults() {
        let overrides = ConfigOverrides {
            upstream_url: Some("http://app:9000".to_string()),
            listen_addr: Some("127.0.0.1:7000".to_string()),
            identity_timeout_secs: Some(0),
            ..Default::default()
        };

        let config = load_config(None, &overrides).unwrap();
        assert_eq!(config.upstream.url, "http://app:9000");
        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
        assert_eq!(config.identity.api_url, "https://kubernetes.default.svc");
        assert_eq!(config.identity.timeout_secs, 0);
    }

    #[test]
    fn test_empty_override_falls_back_to_default() {
        let overrides = ConfigOverrides {
            upstream_url: Some(String::new()),
            ..Default::default()
        };

        let config = load_config(None, &overrides).unwrap();
        assert_eq!(config.upstream.url, "http://localhost:3000");
    }

    #[test]
    fn test_malformed_upstream_is_fatal() {
        let overrides = ConfigOverrides {
            upstream_url: Some("http://".to_string()),
            ..Default::default()
        };

        let err = load_config(None, &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("Validation failed"));
    }

    #[test]
    fn test_file_then_overrides() {
        let path = std::env::temp_dir().join(format!(
            "groups-injector-{}.toml",
            uuid::Uuid::new_v4()
        ));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[upstream]\nurl = \"http://from-file:1\"\n[identity]\napi_url = \"https://api.file:6443\""
        )
        .unwrap();

        let overrides = ConfigOverrides {
            openshift_api_url: Some("https://api.env:6443".to_string()),
            ..Default::default()
        };
        let config = load_config(Some(&path), &overrides).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.upstream.url, "http://from-file:1");
        assert_eq!(config.identity.api_url, "https://api.env:6443");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(
            Some(Path::new("/nonexistent/groups-injector.toml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("JSON"), Ok(LogFormat::Json));
        assert_eq!(parse_log_format("pretty"), Ok(LogFormat::Pretty));
        assert!(parse_log_format("xml").is_err());
    }
}
