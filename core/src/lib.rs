// Core EDU Track client functionality:
// - Authenticated API client
// - Session providers
// - HTTP transport
// - Typed endpoints and payloads
// - Configuration loading
// - Shared error types

// Export client module - authenticated API client
pub mod client;
pub use client::*;

// Export request module - request descriptors
pub mod request;
pub use request::*;

// Export session module - session record and storage
pub mod session;

// Export transport module - HTTP seam
pub mod transport;

// Export api module - typed endpoints
pub mod api;
pub use api::EduTrackApi;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
