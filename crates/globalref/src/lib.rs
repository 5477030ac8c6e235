//! # globalref
//!
//! Durable, opaque 64-bit handles over a host VM's references.
//!
//! A managed caller holds objects through scope-local handles that die
//! with the current call. This crate turns such a handle into an integer it
//! can store anywhere, and turns the integer back into a usable local
//! later. Three reference classes are involved:
//!
//! - **Strong**: keeps the object alive until released
//! - **Weak**: lets the object be collected; resolving then reports it gone
//! - **Local**: what both kinds resolve back into, valid in one scope
//!
//! ## Architecture
//!
//! - [`host::HostEnv`]: the host's reference-table primitives, passed
//!   explicitly to every call
//! - [`bridge`]: typed operations over [`RefHandle`]
//! - [`boundary`]: the `long`-based convention the JNI exports use
//! - [`jvm`] and [`exports`]: the JNI host and its `extern "system"` symbols
//! - [`sim`]: a small collector-backed host for tests
//!
//! The bridge keeps no state and takes no locks. Correct sequencing of
//! create, resolve and release on one handle is the caller's job; failures
//! of the host itself are fatal.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod bridge;
pub mod config;
pub mod error;
pub mod exports;
pub mod frame;
pub mod handle;
pub mod host;
pub mod jvm;
pub mod logging;
pub mod sim;

// Re-export main types
pub use bridge::{create_strong_ref, create_weak_ref, release, resolve, resolve_weak};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use frame::LocalFrame;
pub use handle::{RefHandle, RefKind};
pub use host::{CheckedLocals, HostEnv};
pub use jvm::JvmLocal;

/// globalref version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
