//! Groups injector: an identity-enriching reverse proxy.
//!
//! Sits behind an authenticating edge that passes the user's access token
//! in `X-Forwarded-Access-Token`, resolves the token into group
//! memberships through the identity API, and forwards every request to a
//! single upstream with `X-Forwarded-Groups` set.
//!
//! ```text
//!   Client ──▶ edge ──▶ ┌──────────────────────────────────────────────┐
//!                       │ http::server  (catch-all route, span per req) │
//!                       │      │                                        │
//!                       │      ▼                                        │
//!                       │ enrichment ──▶ identity::client ──────────────┼──▶ Identity API
//!                       │      │                                        │
//!                       │      ▼                                        │
//!                       │ http::forward (hop-by-hop, URI rewrite) ──────┼──▶ Upstream
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! Lookup failures never block a request: it is forwarded without the
//! groups header instead.

// Core subsystems
pub mod config;
pub mod enrichment;
pub mod http;
pub mod identity;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use enrichment::{enrich_headers, EnrichmentOutcome, X_FORWARDED_GROUPS};
pub use http::HttpServer;
pub use identity::{IdentityClient, X_FORWARDED_ACCESS_TOKEN};
pub use lifecycle::Shutdown;
