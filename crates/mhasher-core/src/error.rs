//! Engine error types

use thiserror::Error;

/// Errors that can occur during hashing, set algebra, Merkle reduction or batching
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MhasherError {
    /// Declared record lengths do not cover the byte buffer exactly
    #[error("record lengths sum to {declared} bytes but buffer holds {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Declared record count disagrees with the provided lengths or pointers
    #[error("declared count {declared} but {provided} entries were provided")]
    CountMismatch { declared: usize, provided: usize },

    /// Fixed-width buffer is not a whole number of digests
    #[error("buffer of {len} bytes is not a multiple of digest width {width}")]
    MisalignedDigests { len: usize, width: usize },

    /// Pre-hashed leaves are not the width the algorithm produces
    #[error("leaf width {actual} does not match {algorithm} digest width {expected}")]
    DigestWidthMismatch {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Unknown digest algorithm selector
    #[error("unsupported digest algorithm selector: {0}")]
    UnsupportedAlgorithm(u32),

    /// Unknown branching factor selector
    #[error("unsupported branching factor: {0}")]
    UnsupportedBranching(u32),

    /// A Merkle root or checksum was requested over zero leaves
    #[error("cannot compute a root over zero leaves")]
    EmptyLeaves,

    /// Output region is smaller than the result
    #[error("{what} too small: need {needed}, have {available}")]
    BufferTooSmall {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// Batch session was used after `stop`
    #[error("batch session has been stopped")]
    SessionStopped,

    /// Null pointer where a buffer was required
    #[error("null pointer for {0}")]
    NullPointer(&'static str),

    /// Any other malformed argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation could not be satisfied
    #[error("resource exhausted: cannot hold {requested} bytes")]
    ResourceExhausted { requested: usize },

    /// A pack source could not be read
    #[error("source read failed: {0}")]
    Source(String),
}

/// Coarse classification of an error, stable across the C boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorKind {
    /// The caller passed malformed input; retrying without fixing it cannot succeed
    ContractViolation = 1,
    /// The engine could not allocate what the request needed
    ResourceExhausted = 2,
    /// An external source failed while being staged
    Source = 3,
}

impl MhasherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MhasherError::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            MhasherError::Source(_) => ErrorKind::Source,
            _ => ErrorKind::ContractViolation,
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::ContractViolation
    }
}

/// Result type for engine operations
pub type MhasherResult<T> = Result<T, MhasherError>;

/// Reserve `additional` elements, reporting allocation failure as exhaustion
/// instead of aborting the process.
pub(crate) fn try_reserve<T>(vec: &mut Vec<T>, additional: usize) -> MhasherResult<()> {
    vec.try_reserve(additional)
        .map_err(|_| MhasherError::ResourceExhausted {
            requested: additional.saturating_mul(std::mem::size_of::<T>()),
        })
}
