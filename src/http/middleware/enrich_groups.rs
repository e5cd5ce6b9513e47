//! Group enrichment middleware.
//! Resolves the forwarded access token and injects X-Forwarded-Groups.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::enrichment::enrich_headers;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Enrich the request, then hand it to the forwarder. Never rejects.
pub async fn enrich_groups(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let outcome = enrich_headers(&state.identity, req.headers_mut()).await;
    metrics::record_enrichment(outcome.as_str());
    tracing::debug!(outcome = outcome.as_str(), "Enrichment complete");

    next.run(req).await
}
