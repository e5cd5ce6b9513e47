//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request span)
//!     → middleware/enrich_groups.rs (token → groups header)
//!     → forward.rs (relay to upstream, stream response)
//!     → Send to client
//! ```

pub mod forward;
pub mod middleware;
pub mod server;

pub use forward::{ForwardError, Forwarder, UpstreamTarget};
pub use server::{AppState, HttpServer, ServerError};
