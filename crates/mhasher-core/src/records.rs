//! Record collections.
//!
//! A record collection is one contiguous byte buffer plus the extent of every
//! record inside it. Construction validates that the extents tile the buffer
//! exactly, so every accessor afterwards is infallible.
//!
//! Two concrete layouts share the `Records` interface:
//! - `RecordCollection`: variable-length records, prefix offsets
//! - `FixedDigestCollection`: uniform-width records (digests), stride arithmetic

use std::borrow::Cow;

use crate::digest::Digest;
use crate::error::{try_reserve, MhasherError, MhasherResult};

/// Width of the fixed-digest fast paths.
pub const HASH256_LEN: usize = 32;

/// Indexed read access to an ordered collection of binary records.
///
/// Record order is the original index identity used for stable tie-breaks.
pub trait Records: Sync {
    /// Number of records
    fn count(&self) -> usize;

    /// Bytes of record `index`. Panics if `index >= count()`.
    fn record(&self, index: usize) -> &[u8];

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Sum of all record lengths
    fn total_bytes(&self) -> usize {
        (0..self.count()).map(|i| self.record(i).len()).sum()
    }

    fn iter_records(&self) -> RecordIter<'_, Self> {
        RecordIter {
            records: self,
            next: 0,
        }
    }
}

/// Iterator over the records of any `Records` implementation
pub struct RecordIter<'r, R: Records + ?Sized> {
    records: &'r R,
    next: usize,
}

impl<'r, R: Records + ?Sized> Iterator for RecordIter<'r, R> {
    type Item = &'r [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.records.count() {
            return None;
        }
        let item = self.records.record(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.records.count().saturating_sub(self.next);
        (rest, Some(rest))
    }
}

impl<'r, R: Records + ?Sized> ExactSizeIterator for RecordIter<'r, R> {}

// ============================================================================
// Variable-length records
// ============================================================================

/// Variable-length records stored back-to-back with prefix offsets.
///
/// `offsets` has `count + 1` entries; record `i` spans
/// `offsets[i]..offsets[i + 1]` and the last offset equals the buffer length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCollection<'a> {
    bytes: Cow<'a, [u8]>,
    offsets: Vec<usize>,
}

impl RecordCollection<'static> {
    /// An empty, owned collection
    pub fn new() -> Self {
        Self {
            bytes: Cow::Owned(Vec::new()),
            offsets: vec![0],
        }
    }

    /// Copy `records` into a new owned collection.
    pub fn from_records<I, B>(records: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut bytes = Vec::new();
        let mut offsets = vec![0];
        for r in records {
            bytes.extend_from_slice(r.as_ref());
            offsets.push(bytes.len());
        }
        Self {
            bytes: Cow::Owned(bytes),
            offsets,
        }
    }
}

impl Default for RecordCollection<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RecordCollection<'a> {
    /// Build a collection over `bytes` with one entry in `lengths` per record.
    ///
    /// Fails with `LengthMismatch` unless the lengths sum to exactly `bytes.len()`.
    pub fn from_parts<B, L>(bytes: B, lengths: &[L]) -> MhasherResult<Self>
    where
        B: Into<Cow<'a, [u8]>>,
        L: Copy + Into<u64>,
    {
        let bytes = bytes.into();
        let mut offsets = Vec::new();
        try_reserve(&mut offsets, lengths.len() + 1)?;
        offsets.push(0usize);

        let mut end = 0usize;
        for &len in lengths {
            let len: u64 = len.into();
            let len = usize::try_from(len)
                .map_err(|_| MhasherError::InvalidArgument("record length exceeds address space".into()))?;
            end = end
                .checked_add(len)
                .ok_or_else(|| MhasherError::InvalidArgument("record lengths overflow".into()))?;
            offsets.push(end);
        }

        if end != bytes.len() {
            return Err(MhasherError::LengthMismatch {
                declared: end,
                actual: bytes.len(),
            });
        }

        Ok(Self { bytes, offsets })
    }

    /// Append one record, copying the buffer first if it is borrowed.
    pub fn push(&mut self, record: &[u8]) -> MhasherResult<()> {
        try_reserve(&mut self.offsets, 1)?;
        let bytes = self.bytes.to_mut();
        try_reserve(bytes, record.len())?;
        bytes.extend_from_slice(record);
        self.offsets.push(bytes.len());
        Ok(())
    }

    /// Reserve room for `records` more records totalling `bytes` bytes.
    pub fn reserve(&mut self, records: usize, bytes: usize) -> MhasherResult<()> {
        try_reserve(&mut self.offsets, records)?;
        try_reserve(self.bytes.to_mut(), bytes)
    }

    /// Keep only the first `len` records.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let end = self.offsets[len];
        self.bytes.to_mut().truncate(end);
        self.offsets.truncate(len + 1);
    }

    /// Drop every record, keeping the allocation when owned.
    pub fn clear(&mut self) {
        match &mut self.bytes {
            Cow::Owned(v) => v.clear(),
            Cow::Borrowed(_) => self.bytes = Cow::Owned(Vec::new()),
        }
        self.offsets.clear();
        self.offsets.push(0);
    }

    /// Release all memory held by the collection.
    pub(crate) fn release(&mut self) {
        self.bytes = Cow::Owned(Vec::new());
        self.offsets = vec![0];
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index < self.len() {
            Some(&self.bytes[self.offsets[index]..self.offsets[index + 1]])
        } else {
            None
        }
    }

    /// Start offset of record `index` in the buffer
    pub fn offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    /// Byte length of record `index`
    pub fn length(&self, index: usize) -> usize {
        self.offsets[index + 1] - self.offsets[index]
    }

    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.windows(2).map(|w| w[1] - w[0])
    }

    /// The whole buffer, records back-to-back
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_owned(self) -> RecordCollection<'static> {
        RecordCollection {
            bytes: Cow::Owned(self.bytes.into_owned()),
            offsets: self.offsets,
        }
    }
}

impl Records for RecordCollection<'_> {
    fn count(&self) -> usize {
        self.len()
    }

    fn record(&self, index: usize) -> &[u8] {
        &self.bytes[self.offsets[index]..self.offsets[index + 1]]
    }

    fn total_bytes(&self) -> usize {
        self.bytes.len()
    }
}

// ============================================================================
// Fixed-width digests
// ============================================================================

/// Uniform-width records, typically digests. No length vector: record `i`
/// starts at `i * width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDigestCollection<'a> {
    bytes: Cow<'a, [u8]>,
    width: usize,
}

impl<'a> FixedDigestCollection<'a> {
    /// View `bytes` as consecutive records of `width` bytes.
    pub fn new<B>(bytes: B, width: usize) -> MhasherResult<Self>
    where
        B: Into<Cow<'a, [u8]>>,
    {
        if width == 0 {
            return Err(MhasherError::InvalidArgument("digest width must be non-zero".into()));
        }
        let bytes = bytes.into();
        if bytes.len() % width != 0 {
            return Err(MhasherError::MisalignedDigests {
                len: bytes.len(),
                width,
            });
        }
        Ok(Self { bytes, width })
    }

    /// View `bytes` as exactly `count` records of `width` bytes.
    pub fn with_count<B>(bytes: B, count: usize, width: usize) -> MhasherResult<Self>
    where
        B: Into<Cow<'a, [u8]>>,
    {
        let collection = Self::new(bytes, width)?;
        if collection.len() != count {
            return Err(MhasherError::CountMismatch {
                declared: count,
                provided: collection.len(),
            });
        }
        Ok(collection)
    }

    /// 32-byte records
    pub fn hash256<B>(bytes: B) -> MhasherResult<Self>
    where
        B: Into<Cow<'a, [u8]>>,
    {
        Self::new(bytes, HASH256_LEN)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index < self.len() {
            Some(self.record(index))
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_owned(self) -> FixedDigestCollection<'static> {
        FixedDigestCollection {
            bytes: Cow::Owned(self.bytes.into_owned()),
            width: self.width,
        }
    }
}

impl FixedDigestCollection<'static> {
    /// Pack digests into an owned collection. All digests must share one width.
    pub fn from_digests(digests: &[Digest]) -> MhasherResult<Self> {
        let width = match digests.first() {
            Some(d) => d.len(),
            None => HASH256_LEN,
        };
        let mut bytes = Vec::new();
        try_reserve(&mut bytes, digests.len() * width)?;
        for d in digests {
            if d.len() != width {
                return Err(MhasherError::MisalignedDigests {
                    len: d.len(),
                    width,
                });
            }
            bytes.extend_from_slice(d.as_bytes());
        }
        Ok(Self {
            bytes: Cow::Owned(bytes),
            width,
        })
    }

    /// Copy fixed-width records into an owned collection.
    pub(crate) fn from_records<'r, I>(records: I, width: usize, count: usize) -> MhasherResult<Self>
    where
        I: IntoIterator<Item = &'r [u8]>,
    {
        let mut bytes = Vec::new();
        try_reserve(&mut bytes, count * width)?;
        for r in records {
            bytes.extend_from_slice(r);
        }
        Ok(Self {
            bytes: Cow::Owned(bytes),
            width,
        })
    }
}

impl Records for FixedDigestCollection<'_> {
    fn count(&self) -> usize {
        self.len()
    }

    fn record(&self, index: usize) -> &[u8] {
        let start = index * self.width;
        &self.bytes[start..start + self.width]
    }

    fn total_bytes(&self) -> usize {
        self.bytes.len()
    }
}

// ============================================================================
// Independently allocated records (2D inputs)
// ============================================================================

impl<T> Records for [T]
where
    T: AsRef<[u8]> + Sync,
{
    fn count(&self) -> usize {
        self.len()
    }

    fn record(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

impl<T> Records for Vec<T>
where
    T: AsRef<[u8]> + Sync,
{
    fn count(&self) -> usize {
        self.len()
    }

    fn record(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_offsets() {
        let rc = RecordCollection::from_parts(&b"abcdefg"[..], &[2u32, 0, 5]).unwrap();
        assert_eq!(rc.len(), 3);
        assert_eq!(rc.record(0), b"ab");
        assert_eq!(rc.record(1), b"");
        assert_eq!(rc.record(2), b"cdefg");
        assert_eq!(rc.offset(2), 2);
        assert_eq!(rc.lengths().collect::<Vec<_>>(), vec![2, 0, 5]);
    }

    #[test]
    fn test_from_parts_rejects_short_lengths() {
        let err = RecordCollection::from_parts(&b"abcdefg"[..], &[2u32, 3]).unwrap_err();
        assert_eq!(
            err,
            MhasherError::LengthMismatch {
                declared: 5,
                actual: 7
            }
        );
    }

    #[test]
    fn test_from_parts_rejects_long_lengths() {
        let err = RecordCollection::from_parts(&b"abc"[..], &[2u64, 3]).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_push_on_borrowed_copies() {
        let data = b"xy".to_vec();
        let mut rc = RecordCollection::from_parts(&data[..], &[1u32, 1]).unwrap();
        rc.push(b"zzz").unwrap();
        assert_eq!(rc.len(), 3);
        assert_eq!(rc.as_bytes(), b"xyzzz");
        assert_eq!(data, b"xy");
    }

    #[test]
    fn test_truncate_drops_tail_records() {
        let mut rc = RecordCollection::from_records(["ab", "", "cde", "f"]);
        rc.truncate(2);
        assert_eq!(rc.len(), 2);
        assert_eq!(rc.as_bytes(), b"ab");
        assert_eq!(rc.record(1), b"");

        rc.truncate(5);
        assert_eq!(rc.len(), 2);

        rc.push(b"g").unwrap();
        assert_eq!(rc.record(2), b"g");
    }

    #[test]
    fn test_failed_reserve_leaves_records() {
        let mut rc = RecordCollection::from_records(["ab", "cd"]);
        let err = rc.reserve(0, usize::MAX).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ResourceExhausted);
        assert_eq!(rc.len(), 2);
        assert_eq!(rc.as_bytes(), b"abcd");

        rc.reserve(3, 16).unwrap();
        assert_eq!(rc.len(), 2);
    }

    #[test]
    fn test_clear_resets() {
        let mut rc = RecordCollection::from_records(["a", "bc"]);
        rc.clear();
        assert!(rc.is_empty());
        assert_eq!(rc.total_bytes(), 0);
        assert_eq!(rc.get(0), None);
    }

    #[test]
    fn test_fixed_rejects_misaligned() {
        let err = FixedDigestCollection::hash256(vec![0u8; 33]).unwrap_err();
        assert_eq!(err, MhasherError::MisalignedDigests { len: 33, width: 32 });
    }

    #[test]
    fn test_fixed_count_mismatch() {
        let err = FixedDigestCollection::with_count(vec![0u8; 64], 3, 32).unwrap_err();
        assert_eq!(
            err,
            MhasherError::CountMismatch {
                declared: 3,
                provided: 2
            }
        );
    }

    #[test]
    fn test_fixed_stride() {
        let mut bytes = vec![1u8; 32];
        bytes.extend(vec![2u8; 32]);
        let fc = FixedDigestCollection::hash256(bytes).unwrap();
        assert_eq!(fc.count(), 2);
        assert_eq!(fc.record(1), &[2u8; 32][..]);
    }

    #[test]
    fn test_slice_of_vectors_is_records() {
        let v: Vec<Vec<u8>> = vec![b"one".to_vec(), b"three".to_vec()];
        assert_eq!(v.count(), 2);
        assert_eq!(v.total_bytes(), 8);
        assert_eq!(v.iter_records().len(), 2);
        assert_eq!(v.iter_records().last(), Some(&b"three"[..]));
    }
}
