//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the pipeline core and the host
//! application. Each port is a trait implemented by the host or by an
//! adapter in the infrastructure layer.

mod credential_store;
mod navigator;
mod notifier;
mod transport;

pub use credential_store::CredentialStore;
pub use navigator::Navigator;
pub use notifier::Notifier;
pub use transport::{RequestOptions, Transport, TransportError, UploadProgress};
