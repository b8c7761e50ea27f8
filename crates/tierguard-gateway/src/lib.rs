//! Read-only HTTP API over the Tierguard licensing service.
//!
//! All responses are JSON. Unknown framework or module codes in the path are
//! rejected with `400 Bad Request`.

/// JSON error responses.
pub mod error;
/// Bearer API-key authentication.
pub mod middleware;
/// Router construction and request handlers.
pub mod server;

pub use error::ApiError;
pub use middleware::AuthConfig;
pub use server::GatewayServer;
