//! SmartMix HTTP client
//!
//! [`ApiClient`] attaches the session's bearer token to every request,
//! returns only response payloads, and expires the session when the server
//! answers 401.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder};
pub use types::{ApiEnvelope, LoginRequest, LoginResponse, RegisterRequest, UserInfo};
