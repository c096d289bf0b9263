//! HTTP adapter subsystem.
//!
//! # Data Flow
//! ```text
//! JSON body
//!     → client.rs (POST to the configured endpoint)
//!     → status / transport error mapped to RemoteError
//!     → resilience/ decides whether to retry
//! ```

pub mod client;

pub use client::RemoteClient;
