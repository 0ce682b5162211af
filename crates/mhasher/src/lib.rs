//! mhasher Library (CGO)
//!
//! Bulk Keccak256 / SHA3-256 / RIPEMD160 hashing, Merkle roots and record
//! set algebra behind a C ABI.
//!
//! This library is designed to be used from Go via CGO. Every buffer is
//! allocated and freed by the caller; the only engine-owned memory is a
//! batch session's internal buffer, released by `mhasher_batch_stop`.
//!
//! ## Usage from Go via CGO
//!
//! ```go
//! session := C.mhasher_batch_start()
//! defer C.mhasher_batch_stop(session)
//!
//! status := C.mhasher_batch_pack_paths(session, paths, C.size_t(len(files)))
//! status = C.mhasher_checksum_2d(0, records, lengths, count, &root[0], 32)
//! ```

// Import logging macros
#[macro_use]
extern crate log;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use mhasher_core::{Engine, EngineConfig};

// FFI module for C/CGO integration
pub mod ffi;

mod sessions;

lazy_static! {
    /// Process-wide configuration, seeded from `MHASHER_*` variables
    static ref CONFIG: RwLock<EngineConfig> = RwLock::new(EngineConfig::from_env());
}

/// Initialize the logger for the library.
/// This should be called once at startup, typically from FFI.
///
/// The log level can be controlled via the RUST_LOG environment variable:
/// - RUST_LOG=mhasher=debug
/// - RUST_LOG=mhasher_core=trace
pub fn init_logger() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // A host process may already have installed a logger.
        if env_logger::try_init().is_ok() {
            info!("{} initialized", mhasher_core::product());
        }
    });
}

/// Engine bound to a snapshot of the current process-wide configuration
pub fn engine() -> Engine {
    Engine::with_config(CONFIG.read().clone())
}

/// Current process-wide configuration
pub fn config() -> EngineConfig {
    CONFIG.read().clone()
}

/// Replace the process-wide configuration. Sessions already started keep
/// the byte ceiling they were started with.
pub fn configure(config: EngineConfig) {
    debug!("configuration replaced: {:?}", config);
    *CONFIG.write() = config;
}

// Re-export main types
pub use mhasher_core::{
    Algorithm, BatchSession, Branching, Digest, ErrorKind, MhasherError, MhasherResult,
};

// Re-export FFI types for C consumers
pub use ffi::MhasherStatusC;
