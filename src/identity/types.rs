//! Identity API wire types and error definitions.

use serde::Deserialize;
use thiserror::Error;

/// Path of the "current user" resource on the identity API.
pub const CURRENT_USER_PATH: &str = "/apis/user.openshift.io/v1/users/~";

/// User metadata as returned by the identity API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: String,
}

/// Result of a successful lookup.
///
/// Groups are kept exactly as returned: order, duplicates and case are
/// preserved. A missing or `null` group list decodes as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityRecord {
    #[serde(default)]
    pub metadata: UserMetadata,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub groups: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors that can occur during an identity lookup.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("identity API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The identity API answered with something other than 200.
    #[error("identity API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A 200 response whose body is not a user object.
    #[error("identity API response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("identity client setup failed: {0}")]
    Build(String),
}

impl IdentityError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityError::Transport(_) => "transport",
            IdentityError::Status { .. } => "status",
            IdentityError::Decode(_) => "decode",
            IdentityError::Build(_) => "build",
        }
    }
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
