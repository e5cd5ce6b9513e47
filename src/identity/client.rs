//! Identity API client.
//!
//! # Responsibilities
//! - Resolve a bearer token into the user's group list
//! - One outbound request per call, no caching and no retries
//! - Keep transport, status and decode failures distinct

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::IdentityConfig;
use crate::identity::token::BearerToken;
use crate::identity::types::{IdentityError, IdentityRecord, IdentityResult, CURRENT_USER_PATH};

/// Client for the identity API's "current user" endpoint.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    user_url: String,
}

impl IdentityClient {
    /// Build a client from configuration.
    ///
    /// A configured CA bundle is added to the trusted roots. Certificate
    /// verification is only skipped when explicitly requested.
    pub fn new(config: &IdentityConfig) -> IdentityResult<Self> {
        let mut builder = reqwest::Client::builder().no_proxy();

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                IdentityError::Build(format!("failed to read CA file '{}': {}", path, e))
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                IdentityError::Build(format!("invalid CA bundle '{}': {}", path, e))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if config.insecure_skip_verify {
            tracing::warn!(
                api_url = %config.api_url,
                "Certificate verification for the identity API is disabled"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| IdentityError::Build(e.to_string()))?;

        Ok(Self {
            http,
            user_url: format!(
                "{}{}",
                config.api_url.trim_end_matches('/'),
                CURRENT_USER_PATH
            ),
        })
    }

    /// Full URL of the current-user resource.
    pub fn user_url(&self) -> &str {
        &self.user_url
    }

    /// Look up the user the token belongs to.
    pub async fn fetch_user(&self, token: &BearerToken) -> IdentityResult<IdentityRecord> {
        let response = self
            .http
            .get(&self.user_url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Look up the token's groups, in the order the identity API returns them.
    pub async fn fetch_groups(&self, token: &BearerToken) -> IdentityResult<Vec<String>> {
        let user = self.fetch_user(token).await?;
        tracing::debug!(user = %user.metadata.name, groups = user.groups.len(), "Resolved identity");
        Ok(user.groups)
    }
}
