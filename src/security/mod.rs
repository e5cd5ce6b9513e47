//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → enrichment (may overwrite X-Forwarded-Groups)
//!     → headers.rs (strip hop-by-hop, keep upgrade intent)
//!     → upstream
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → client
//! ```

pub mod headers;

pub use headers::{set_upgrade, strip_hop_by_hop, strip_request_hop_by_hop, upgrade_type};
