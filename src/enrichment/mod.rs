//! Per-request group enrichment.
//!
//! # Data Flow
//! ```text
//! Received
//!     → TokenCheck (no token: forward untouched)
//!     → GroupsLookup (error: log, forward untouched)
//!         → empty groups: forward untouched
//!         → groups: overwrite X-Forwarded-Groups with "g1,g2,..."
//!     → Forward
//! ```
//!
//! # Design Decisions
//! - Fail-open: lookup failures never block the request
//! - Group names are joined with "," verbatim, without escaping
//! - No state survives between requests

use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::identity::{BearerToken, IdentityClient, IdentityError};
use crate::observability::metrics;

/// Header the resolved group list is written to.
pub const X_FORWARDED_GROUPS: HeaderName = HeaderName::from_static("x-forwarded-groups");

/// What one pass of the enrichment state machine did to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// No usable token header; request untouched.
    NoToken,
    /// The identity lookup failed; request untouched.
    LookupFailed,
    /// The user has no groups; request untouched.
    NoGroups,
    /// The groups header was set.
    Injected { count: usize },
    /// The joined group list is not a legal header value; request untouched.
    InvalidHeaderValue,
}

impl EnrichmentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentOutcome::NoToken => "no_token",
            EnrichmentOutcome::LookupFailed => "lookup_failed",
            EnrichmentOutcome::NoGroups => "no_groups",
            EnrichmentOutcome::Injected { .. } => "injected",
            EnrichmentOutcome::InvalidHeaderValue => "invalid_header_value",
        }
    }
}

/// Encode a group list for the groups header.
pub fn join_groups(groups: &[String]) -> String {
    groups.join(",")
}

/// Run the enrichment state machine over a request's headers.
///
/// Headers are only modified when the outcome is
/// [`EnrichmentOutcome::Injected`].
pub async fn enrich_headers(identity: &IdentityClient, headers: &mut HeaderMap) -> EnrichmentOutcome {
    let Some(token) = BearerToken::from_headers(headers) else {
        return EnrichmentOutcome::NoToken;
    };

    let start = Instant::now();
    let groups = match identity.fetch_groups(&token).await {
        Ok(groups) => {
            metrics::record_lookup("ok", start);
            groups
        }
        Err(e) => {
            metrics::record_lookup(e.kind(), start);
            log_lookup_error(&e);
            return EnrichmentOutcome::LookupFailed;
        }
    };

    if groups.is_empty() {
        tracing::debug!("User has no groups, forwarding without groups header");
        return EnrichmentOutcome::NoGroups;
    }

    let joined = join_groups(&groups);
    match HeaderValue::from_str(&joined) {
        Ok(value) => {
            headers.insert(X_FORWARDED_GROUPS, value);
            tracing::info!(groups = %joined, "Injected groups");
            EnrichmentOutcome::Injected {
                count: groups.len(),
            }
        }
        Err(_) => {
            tracing::warn!(
                groups = ?groups,
                "Group list is not a valid header value, forwarding without groups header"
            );
            EnrichmentOutcome::InvalidHeaderValue
        }
    }
}

fn log_lookup_error(error: &IdentityError) {
    match error {
        IdentityError::Status { status, body } => {
            tracing::warn!(status, body = %body, "Error fetching user groups");
        }
        other => {
            tracing::warn!(kind = other.kind(), error = %other, "Error fetching user groups");
        }
    }
}
