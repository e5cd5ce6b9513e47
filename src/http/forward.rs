//! Reverse proxy forwarding to the single upstream.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream base URL
//! - Strip hop-by-hop headers in both directions
//! - Stream the upstream response back without buffering
//! - Relay `101 Switching Protocols` upgrades (e.g. WebSocket)
//! - Map transport failures to 502 and timeouts to 504

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header,
        uri::{Authority, Scheme},
        Extensions, HeaderValue, Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
};
use hyper::{body::Incoming, upgrade::OnUpgrade};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;
use crate::security::headers::{
    set_upgrade, strip_hop_by_hop, strip_request_hop_by_hop, upgrade_type,
};

/// Errors produced while relaying a request upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The configured upstream cannot be used as a proxy target.
    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidUpstream { url: String, reason: String },

    /// The rewritten request URI is not valid.
    #[error("failed to build upstream URI: {0}")]
    Uri(#[from] axum::http::Error),

    /// Connection or protocol failure talking to the upstream.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// TLS setup for an `https` upstream failed.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    /// The upstream answered 101 with a protocol the client did not ask for.
    #[error("upstream switched to {offered:?}, client requested {requested:?}")]
    UpgradeMismatch {
        requested: HeaderValue,
        offered: Option<HeaderValue>,
    },

    /// The upstream did not answer in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Status returned to the original caller for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// The fixed destination every request is relayed to.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    base_query: Option<String>,
}

impl UpstreamTarget {
    /// Parse an `http(s)://host[:port][/base][?query]` upstream URL.
    pub fn parse(raw: &str) -> Result<Self, ForwardError> {
        let invalid = |reason: String| ForwardError::InvalidUpstream {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(invalid(format!("unsupported scheme '{}'", other))),
        };
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        let authority = &url[url::Position::BeforeHost..url::Position::AfterPort];
        let authority = Authority::from_str(authority).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Map an inbound request URI onto the upstream.
    pub fn rewrite(&self, uri: &Uri) -> Result<Uri, ForwardError> {
        let path = join_path(&self.base_path, uri.path());
        let query = match (
            self.base_query.as_deref(),
            uri.query().filter(|q| !q.is_empty()),
        ) {
            (Some(base), Some(req)) => Some(format!("{}&{}", base, req)),
            (Some(base), None) => Some(base.to_string()),
            (None, Some(req)) => Some(req.to_string()),
            (None, None) => None,
        };

        let path_and_query = match query {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        let uri = Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()?;
        Ok(uri)
    }
}

/// Join two path segments with exactly one slash between them.
fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Relays requests to the upstream over a pooled HTTP(S) client.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    target: UpstreamTarget,
    timeout: Option<Duration>,
}

impl Forwarder {
    /// Create a forwarder for the given upstream URL.
    ///
    /// `https` upstreams are verified against the webpki root store.
    pub fn new(upstream_url: &str, timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        let target = UpstreamTarget::parse(upstream_url)?;
        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(Arc::new(rustls::crypto::ring::default_provider()))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        let timeout = (timeouts.upstream_secs > 0)
            .then(|| Duration::from_secs(timeouts.upstream_secs));

        Ok(Self {
            client,
            target,
            timeout,
        })
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Relay a request and return the upstream response.
    ///
    /// Method, path, query, end-to-end headers and body are passed through.
    /// `Host` is dropped so the client derives it from the upstream authority.
    /// Upgrade requests keep `Connection: upgrade` and `Upgrade`; on a 101 the
    /// two connections are spliced together in a background task.
    pub async fn forward(&self, mut request: Request<Body>) -> Result<Response, ForwardError> {
        let upgrade = upgrade_type(request.headers());
        let client_upgrade = upgrade
            .is_some()
            .then(|| hyper::upgrade::on(&mut request));

        let (mut parts, body) = request.into_parts();

        parts.uri = self.target.rewrite(&parts.uri)?;
        parts.version = Version::HTTP_11;
        parts.extensions = Extensions::new();
        strip_request_hop_by_hop(&mut parts.headers);
        parts.headers.remove(header::HOST);
        if let Some(protocol) = &upgrade {
            set_upgrade(&mut parts.headers, protocol.clone());
        }

        let pending = self.client.request(Request::from_parts(parts, body));
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ForwardError::Timeout(limit))??,
            None => pending.await?,
        };

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            if let (Some(requested), Some(client_upgrade)) = (upgrade, client_upgrade) {
                return switch_protocols(requested, client_upgrade, response);
            }
        }

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Answer the client's upgrade and splice both upgraded connections.
fn switch_protocols(
    requested: HeaderValue,
    client_upgrade: OnUpgrade,
    mut response: Response<Incoming>,
) -> Result<Response, ForwardError> {
    let offered = upgrade_type(response.headers());
    let matches = offered
        .as_ref()
        .is_some_and(|o| o.as_bytes().eq_ignore_ascii_case(requested.as_bytes()));
    if !matches {
        return Err(ForwardError::UpgradeMismatch {
            requested,
            offered,
        });
    }

    let upstream_upgrade = hyper::upgrade::on(&mut response);
    tokio::spawn(async move {
        match tokio::try_join!(client_upgrade, upstream_upgrade) {
            Ok((client, upstream)) => {
                let mut client = TokioIo::new(client);
                let mut upstream = TokioIo::new(upstream);
                match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
                    Ok((sent, received)) => {
                        tracing::debug!(sent, received, "Upgraded connection closed");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Upgraded connection closed with error");
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "Connection upgrade failed"),
        }
    });

    let (mut parts, _) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    set_upgrade(&mut parts.headers, requested);
    Ok(Response::from_parts(parts, Body::empty()))
}
