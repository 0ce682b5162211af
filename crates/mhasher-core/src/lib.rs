//! mhasher core engine
//!
//! Bulk cryptographic hashing over large collections of binary records:
//! digests, Merkle roots, and the set algebra (sort, unique, remove) used to
//! canonicalise record sets before hashing them. Also provides the batch
//! buffer used to stage many small inputs into one contiguous region.
//!
//! # Features
//!
//! - `parallel` (default) - rayon-backed digesting, sorting and Merkle level
//!   reduction above configurable thresholds. Results are identical with the
//!   feature on or off.
//!
//! # Example
//!
//! ```rust
//! use mhasher_core::{Algorithm, Branching, Engine, FixedDigestCollection};
//!
//! let engine = Engine::new();
//!
//! // Sorted, deduplicated view over raw records
//! let records = vec!["b", "a", "b"];
//! assert_eq!(engine.unique_sort(&records), vec![1, 0]);
//!
//! // Binary Merkle root over pre-hashed leaves
//! let leaves = engine.multiple_hashes(Algorithm::Keccak256, &records);
//! let leaves = FixedDigestCollection::from_digests(&leaves).unwrap();
//! let root = engine
//!     .merkle_root(Algorithm::Keccak256, Branching::Binary, &leaves)
//!     .unwrap();
//! assert_eq!(root.len(), 32);
//! ```

pub mod batch;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod merkle;
mod parallel;
pub mod records;
pub mod setops;

// Re-export main types at crate root
pub use batch::BatchSession;
pub use config::EngineConfig;
pub use digest::{multiple_hashes, write_concatenated, Algorithm, Digest, MAX_DIGEST_LEN};
pub use engine::Engine;
pub use error::{ErrorKind, MhasherError, MhasherResult};
pub use merkle::{checksum, merkle_root, Branching, MerkleNode, MerkleTree};
pub use records::{FixedDigestCollection, RecordCollection, RecordIter, Records, HASH256_LEN};
pub use setops::{
    compact, gather, quick_unique_hash256, remove, sort, sort_hash256, unique, unique_hash256,
    unique_sort, KeepMask, Permutation,
};

/// Product name reported across the C boundary
pub const PRODUCT: &str = "mhasher";

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Product description with a trailing NUL, for handing across the C boundary
/// without an allocation.
pub const PRODUCT_CSTR: &str =
    concat!("mhasher ", env!("CARGO_PKG_VERSION"), " (keccak256, sha3-256, ripemd160)\0");

/// Product description
pub fn product() -> &'static str {
    PRODUCT_CSTR.trim_end_matches('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_matches_c_string() {
        assert!(PRODUCT_CSTR.ends_with('\0'));
        assert_eq!(&PRODUCT_CSTR[..PRODUCT_CSTR.len() - 1], product());
        assert!(product().starts_with(PRODUCT));
        assert!(product().contains(version()));
        assert!(!product().contains('\0'));
    }
}
