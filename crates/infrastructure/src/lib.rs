//! Relay Infrastructure - transport adapters
//!
//! Implements the application layer's `Transport` port on top of reqwest.

pub mod adapters;

pub use adapters::ReqwestTransport;
