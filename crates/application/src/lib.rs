//! Relay Application - the authenticated request pipeline
//!
//! This crate composes path/payload sanitization, auth header derivation,
//! failure classification and single-flight token refresh around a
//! transport port. The host application supplies the credential store,
//! the notifier, the navigator and the transport; everything here is
//! testable with fakes.

pub mod client;
pub mod config;
pub mod failure;
pub mod headers;
pub mod ports;
pub mod refresh;
pub mod sanitize;

pub use client::{ApiClient, CallResult, SanitizeMode};
pub use config::ClientConfig;
pub use failure::ErrorClassifier;
pub use headers::AuthHeaderBuilder;
pub use ports::{
    CredentialStore, Navigator, Notifier, RequestOptions, Transport, TransportError,
    UploadProgress,
};
pub use refresh::{RefreshCoordinator, RefreshError};
