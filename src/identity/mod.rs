//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! X-Forwarded-Access-Token header
//!     → token.rs (BearerToken, empty means absent)
//!     → client.rs (GET {api}/apis/user.openshift.io/v1/users/~)
//!     → types.rs (IdentityRecord or IdentityError)
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound call per lookup; nothing is cached
//! - Failures stay typed so the caller can log them precisely

pub mod client;
pub mod token;
pub mod types;

pub use client::IdentityClient;
pub use token::{BearerToken, X_FORWARDED_ACCESS_TOKEN};
pub use types::{IdentityError, IdentityRecord, IdentityResult, UserMetadata};
