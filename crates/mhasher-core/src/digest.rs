//! Digest provider.
//!
//! Three interchangeable algorithms behind one closed selector. Each variant
//! dispatches to a RustCrypto hasher through the shared `digest::Digest`
//! trait, so the transforms themselves stay pluggable primitives.

use std::fmt;

use ripemd::Ripemd160;
use sha3::digest::Digest as HashFunction;
use sha3::{Keccak256, Sha3_256};

use crate::config::EngineConfig;
use crate::error::{MhasherError, MhasherResult};
use crate::parallel;
use crate::records::Records;

/// Widest digest any supported algorithm produces.
pub const MAX_DIGEST_LEN: usize = 32;

/// Supported digest algorithms (C selector in parentheses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Legacy Keccak-256 as used by Ethereum (0)
    Keccak256,
    /// FIPS 202 SHA3-256 (1)
    Sha3_256,
    /// RIPEMD-160 (2)
    Ripemd160,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Keccak256, Algorithm::Sha3_256, Algorithm::Ripemd160];

    /// Resolve a C-boundary selector
    pub fn from_selector(selector: u32) -> MhasherResult<Self> {
        match selector {
            0 => Ok(Algorithm::Keccak256),
            1 => Ok(Algorithm::Sha3_256),
            2 => Ok(Algorithm::Ripemd160),
            other => Err(MhasherError::UnsupportedAlgorithm(other)),
        }
    }

    pub fn selector(self) -> u32 {
        match self {
            Algorithm::Keccak256 => 0,
            Algorithm::Sha3_256 => 1,
            Algorithm::Ripemd160 => 2,
        }
    }

    /// Digest size in bytes
    pub const fn output_len(self) -> usize {
        match self {
            Algorithm::Keccak256 | Algorithm::Sha3_256 => 32,
            Algorithm::Ripemd160 => 20,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Keccak256 => "keccak256",
            Algorithm::Sha3_256 => "sha3-256",
            Algorithm::Ripemd160 => "ripemd160",
        }
    }

    /// Digest one byte sequence. Empty input yields the algorithm's empty digest.
    pub fn digest(self, bytes: &[u8]) -> Digest {
        self.digest_parts(std::iter::once(bytes))
    }

    /// Digest the concatenation of `parts` without materialising it.
    pub fn digest_parts<I, B>(self, parts: I) -> Digest
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        match self {
            Algorithm::Keccak256 => compute::<Keccak256, _, _>(self, parts),
            Algorithm::Sha3_256 => compute::<Sha3_256, _, _>(self, parts),
            Algorithm::Ripemd160 => compute::<Ripemd160, _, _>(self, parts),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn compute<H, I, B>(algorithm: Algorithm, parts: I) -> Digest
where
    H: HashFunction,
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut hasher = H::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    let out = hasher.finalize();

    let mut bytes = [0u8; MAX_DIGEST_LEN];
    bytes[..out.len()].copy_from_slice(&out);
    Digest { algorithm, bytes }
}

/// Immutable fixed-size digest value.
///
/// Width is fixed by the producing algorithm; unused tail bytes are zero and
/// never observable through the accessors.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: Algorithm,
    bytes: [u8; MAX_DIGEST_LEN],
}

impl Digest {
    /// Wrap caller-supplied digest bytes (e.g. a pre-hashed Merkle leaf).
    pub fn from_slice(algorithm: Algorithm, bytes: &[u8]) -> MhasherResult<Self> {
        if bytes.len() != algorithm.output_len() {
            return Err(MhasherError::DigestWidthMismatch {
                algorithm: algorithm.name(),
                expected: algorithm.output_len(),
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; MAX_DIGEST_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            algorithm,
            bytes: buf,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.algorithm.output_len()]
    }

    pub fn len(&self) -> usize {
        self.algorithm.output_len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.as_bytes() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self)
    }
}

/// Digest every record independently, preserving input order.
pub fn multiple_hashes<R>(algorithm: Algorithm, records: &R, config: &EngineConfig) -> Vec<Digest>
where
    R: Records + ?Sized,
{
    parallel::map_indices(records.count(), config.parallel_threshold, |i| {
        algorithm.digest(records.record(i))
    })
}

/// Write digests back-to-back into `out`, returning the number of bytes written.
pub fn write_concatenated(digests: &[Digest], out: &mut [u8]) -> MhasherResult<usize> {
    let needed: usize = digests.iter().map(Digest::len).sum();
    if out.len() < needed {
        return Err(MhasherError::BufferTooSmall {
            what: "digest output buffer",
            needed,
            available: out.len(),
        });
    }
    let mut pos = 0;
    for d in digests {
        out[pos..pos + d.len()].copy_from_slice(d.as_bytes());
        pos += d.len();
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_lengths() {
        assert_eq!(Algorithm::Keccak256.digest(b"x").len(), 32);
        assert_eq!(Algorithm::Sha3_256.digest(b"x").len(), 32);
        assert_eq!(Algorithm::Ripemd160.digest(b"x").as_bytes().len(), 20);
    }

    #[test]
    fn test_selector_roundtrip() {
        for alg in Algorithm::ALL {
            assert_eq!(Algorithm::from_selector(alg.selector()).unwrap(), alg);
        }
        assert_eq!(
            Algorithm::from_selector(7),
            Err(MhasherError::UnsupportedAlgorithm(7))
        );
    }

    #[test]
    fn test_digest_parts_matches_concatenation() {
        let joined = Algorithm::Keccak256.digest(b"helloworld");
        let parts = Algorithm::Keccak256.digest_parts([&b"hello"[..], &b"world"[..]]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_algorithms_disagree() {
        let k = Algorithm::Keccak256.digest(b"abc");
        let s = Algorithm::Sha3_256.digest(b"abc");
        assert_ne!(k.as_bytes(), s.as_bytes());
    }

    #[test]
    fn test_from_slice_rejects_wrong_width() {
        let err = Digest::from_slice(Algorithm::Ripemd160, &[0u8; 32]).unwrap_err();
        assert!(matches!(err, MhasherError::DigestWidthMismatch { expected: 20, actual: 32, .. }));
    }

    #[test]
    fn test_write_concatenated_too_small() {
        let d = Algorithm::Sha3_256.digest(b"a");
        let mut out = [0u8; 16];
        assert!(matches!(
            write_concatenated(&[d], &mut out),
            Err(MhasherError::BufferTooSmall { needed: 32, .. })
        ));
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        let d = Digest::from_slice(Algorithm::Ripemd160, &[0xAB; 20]).unwrap();
        assert_eq!(d.to_hex(), "ab".repeat(20));
    }
}
