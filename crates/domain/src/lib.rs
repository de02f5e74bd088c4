//! Relay Domain - Core request/response types
//!
//! This crate defines the data model for the Relay API client core.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod envelope;
pub mod request;

pub use auth::AuthToken;
pub use envelope::{
    CONNECT_FAILED_MESSAGE, ErrorEnvelope, GENERIC_SERVER_ERROR, ResultEnvelope,
    SESSION_EXPIRED_MESSAGE,
};
pub use request::{ApiRequest, ApiResponse, FilePart, HttpMethod, MultipartPayload, RequestBody};
