//! C-compatible FFI interface
//!
//! Exposes the hashing, set-algebra, Merkle and batch engines through a C ABI
//! for integration with Go via CGO.
//!
//! # Memory Ownership Rules
//!
//! - Every input and output buffer is allocated and freed by the caller
//! - Output regions are passed with their capacity; an undersized region is
//!   rejected before anything is written
//! - `mhasher_batch_start()` returns an opaque id; `mhasher_batch_stop()`
//!   releases the session's internal buffer and retires the id
//! - A failed call returns a status whose `error_msg` is owned by the caller
//!   and must be released with `mhasher_status_free()`
//!
//! # Selectors
//!
//! - algorithm: 0 = Keccak256, 1 = SHA3-256, 2 = RIPEMD160
//! - branching: 2 = binary, 16 = sexdec
//! - keep masks: `MHASHER_KEEP` (255) survives, `MHASHER_DROP` (0) is removed

use std::os::raw::c_char;
use std::ptr;

use mhasher_core::{
    write_concatenated, Algorithm, Branching, Digest, FixedDigestCollection, MhasherError, MhasherResult,
    RecordCollection, Records, HASH256_LEN,
};
use mhasher_ffi_common::{convert_string_array, cstr_to_str, slice_from_raw, slice_from_raw_mut, FfiResult};

use crate::sessions;

/// Keep-mask byte for a surviving record
pub const MHASHER_KEEP: u8 = 255;
/// Keep-mask byte for a removed record
pub const MHASHER_DROP: u8 = 0;

/// Outcome of every fallible call.
///
/// `error_code` is 0 on success, otherwise the error kind:
/// 1 = contract violation, 2 = resource exhausted, 3 = source failure.
#[repr(C)]
pub struct MhasherStatusC {
    pub success: bool,
    pub error_code: i32,
    pub error_msg: *mut c_char,
}

impl MhasherStatusC {
    fn ok() -> Self {
        Self {
            success: true,
            error_code: 0,
            error_msg: ptr::null_mut(),
        }
    }
}

impl FfiResult for MhasherStatusC {
    const ERROR_FALLBACK: &'static str = "mhasher error";

    fn error_fields(error_code: i32, error_msg: *mut c_char) -> Self {
        Self {
            success: false,
            error_code,
            error_msg,
        }
    }
}

/// Run one boundary call and fold its result into a status.
fn run<F>(op: &'static str, f: F) -> MhasherStatusC
where
    F: FnOnce() -> MhasherResult<()>,
{
    match f() {
        Ok(()) => MhasherStatusC::ok(),
        Err(e) => {
            if e.is_contract_violation() {
                warn!("{} rejected: {}", op, e);
            } else {
                error!("{} failed: {}", op, e);
            }
            MhasherStatusC::error(e.kind() as i32, &e.to_string())
        }
    }
}

// ============================================================================
// Boundary helpers
// ============================================================================

unsafe fn input<'a, T>(ptr: *const T, len: usize, what: &'static str) -> MhasherResult<&'a [T]> {
    unsafe { slice_from_raw(ptr, len, what) }.map_err(MhasherError::NullPointer)
}

unsafe fn output<'a, T>(ptr: *mut T, len: usize, what: &'static str) -> MhasherResult<&'a mut [T]> {
    unsafe { slice_from_raw_mut(ptr, len, what) }.map_err(MhasherError::NullPointer)
}

unsafe fn out_value<'a, T>(ptr: *mut T, what: &'static str) -> MhasherResult<&'a mut T> {
    unsafe { ptr.as_mut() }.ok_or(MhasherError::NullPointer(what))
}

fn to_usize(value: u64, what: &str) -> MhasherResult<usize> {
    usize::try_from(value)
        .map_err(|_| MhasherError::InvalidArgument(format!("{} {} exceeds address space", what, value)))
}

fn ensure_capacity(what: &'static str, needed: usize, available: usize) -> MhasherResult<()> {
    if available < needed {
        return Err(MhasherError::BufferTooSmall {
            what,
            needed,
            available,
        });
    }
    Ok(())
}

/// Borrow a flat buffer and its co-indexed length vector as records.
unsafe fn flat_records<'a, L>(
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const L,
    count: usize,
) -> MhasherResult<RecordCollection<'a>>
where
    L: Copy + Into<u64>,
{
    let bytes = unsafe { input(bytes, bytes_len, "bytes") }?;
    let lengths = unsafe { input(lengths, count, "lengths") }?;
    RecordCollection::from_parts(bytes, lengths)
}

/// Borrow an array of record pointers with one length each.
unsafe fn pointer_records<'a>(
    records: *const *const u8,
    lengths: *const u64,
    count: usize,
) -> MhasherResult<Vec<&'a [u8]>> {
    let ptrs = unsafe { input(records, count, "records") }?;
    let lengths = unsafe { input(lengths, count, "lengths") }?;
    let mut out = Vec::new();
    out.try_reserve(count)
        .map_err(|_| MhasherError::ResourceExhausted {
            requested: count.saturating_mul(std::mem::size_of::<&[u8]>()),
        })?;
    for (&ptr, &len) in ptrs.iter().zip(lengths) {
        let len = to_usize(len, "record length")?;
        out.push(unsafe { input(ptr, len, "record") }?);
    }
    Ok(out)
}

/// Borrow `count` consecutive digests of `width` bytes.
unsafe fn fixed_digests<'a>(
    bytes: *const u8,
    count: u64,
    width: usize,
) -> MhasherResult<FixedDigestCollection<'a>> {
    let count = to_usize(count, "digest count")?;
    let len = count
        .checked_mul(width)
        .ok_or_else(|| MhasherError::InvalidArgument("digest buffer size overflows".into()))?;
    let bytes = unsafe { input(bytes, len, "digests") }?;
    FixedDigestCollection::with_count(bytes, count, width)
}

fn write_digest(digest: &Digest, out: &mut [u8]) -> MhasherResult<()> {
    write_concatenated(std::slice::from_ref(digest), out).map(|_| ())
}

fn write_mask(mask: &[bool], out: &mut [u8]) -> MhasherResult<()> {
    ensure_capacity("mask", mask.len(), out.len())?;
    for (slot, &keep) in out.iter_mut().zip(mask) {
        *slot = if keep { MHASHER_KEEP } else { MHASHER_DROP };
    }
    Ok(())
}

/// Write u32 indices; callers only pass indices below a u32 record count.
fn write_indices_u32(indices: &[usize], out: &mut [u32]) -> MhasherResult<()> {
    ensure_capacity("indices", indices.len(), out.len())?;
    for (slot, &i) in out.iter_mut().zip(indices) {
        *slot = i as u32;
    }
    Ok(())
}

fn write_unique_digests(
    unique: &FixedDigestCollection<'_>,
    out: &mut [u8],
    out_count: &mut u64,
) -> MhasherResult<()> {
    let bytes = unique.as_bytes();
    ensure_capacity("unique digest buffer", bytes.len(), out.len())?;
    out[..bytes.len()].copy_from_slice(bytes);
    *out_count = unique.len() as u64;
    Ok(())
}

// ============================================================================
// Lifecycle & Configuration
// ============================================================================

#[no_mangle]
pub extern "C" fn mhasher_init_logger() {
    crate::init_logger();
}

/// Replace the process-wide configuration from a JSON document, e.g.
/// `{"parallel_threshold": 4096}`. Missing fields take their defaults.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_configure(json: *const c_char) -> MhasherStatusC {
    run("configure", || {
        let json = unsafe { cstr_to_str(json) }
            .map_err(|e| MhasherError::InvalidArgument(format!("config JSON: {}", e)))?;
        crate::configure(mhasher_core::EngineConfig::from_json(json)?);
        Ok(())
    })
}

mhasher_ffi_common::define_version_fn!(mhasher_version);

#[no_mangle]
pub extern "C" fn mhasher_product() -> *const c_char {
    mhasher_core::PRODUCT_CSTR.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn mhasher_status_free(status: MhasherStatusC) {
    unsafe { mhasher_ffi_common::free_cstring(status.error_msg) };
}

// ============================================================================
// Digests
// ============================================================================

/// Digest one byte run into `out` (at least 32 or 20 bytes per algorithm).
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_single_hash(
    algorithm: u32,
    bytes: *const u8,
    len: usize,
    out: *mut u8,
    out_len: usize,
) -> MhasherStatusC {
    run("single_hash", || {
        let algorithm = Algorithm::from_selector(algorithm)?;
        let bytes = unsafe { input(bytes, len, "bytes") }?;
        let out = unsafe { output(out, out_len, "out") }?;
        write_digest(&algorithm.digest(bytes), out)
    })
}

/// Digest every record of a flat buffer, writing the digests back-to-back.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_multiple_hashes(
    algorithm: u32,
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const u64,
    count: usize,
    out: *mut u8,
    out_len: usize,
) -> MhasherStatusC {
    run("multiple_hashes", || {
        let algorithm = Algorithm::from_selector(algorithm)?;
        let records = unsafe { flat_records(bytes, bytes_len, lengths, count) }?;
        let out = unsafe { output(out, out_len, "out") }?;
        let digests = crate::engine().multiple_hashes(algorithm, &records);
        write_concatenated(&digests, out).map(|_| ())
    })
}

/// Digest every record of a pointer array into a matching array of output
/// regions, each `out_width` bytes long.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_multiple_hashes_2d(
    algorithm: u32,
    records: *const *const u8,
    lengths: *const u64,
    count: usize,
    out: *const *mut u8,
    out_width: usize,
) -> MhasherStatusC {
    run("multiple_hashes_2d", || {
        let algorithm = Algorithm::from_selector(algorithm)?;
        ensure_capacity("digest output region", algorithm.output_len(), out_width)?;
        let records = unsafe { pointer_records(records, lengths, count) }?;
        let outs = unsafe { input(out, count, "out") }?;
        if outs.iter().any(|p| p.is_null()) {
            return Err(MhasherError::NullPointer("out"));
        }

        let digests = crate::engine().multiple_hashes(algorithm, &records);
        for (digest, &dst) in digests.iter().zip(outs) {
            let dst = unsafe { output(dst, out_width, "out") }?;
            write_digest(digest, dst)?;
        }
        Ok(())
    })
}

// ============================================================================
// Merkle
// ============================================================================

/// Checksum of one raw record: its digest.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_checksum(
    algorithm: u32,
    bytes: *const u8,
    len: usize,
    out: *mut u8,
    out_len: usize,
) -> MhasherStatusC {
    run("checksum", || {
        let algorithm = Algorithm::from_selector(algorithm)?;
        let record = unsafe { input(bytes, len, "bytes") }?;
        let out = unsafe { output(out, out_len, "out") }?;
        let root = crate::engine().checksum(algorithm, &[record][..])?;
        write_digest(&root, out)
    })
}

/// Flat checksum over an array of raw records.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_checksum_2d(
    algorithm: u32,
    records: *const *const u8,
    lengths: *const u64,
    count: usize,
    out: *mut u8,
    out_len: usize,
) -> MhasherStatusC {
    run("checksum_2d", || {
        let algorithm = Algorithm::from_selector(algorithm)?;
        let records = unsafe { pointer_records(records, lengths, count) }?;
        let out = unsafe { output(out, out_len, "out") }?;
        let root = crate::engine().checksum(algorithm, &records)?;
        write_digest(&root, out)
    })
}

/// Multi-level root over `count` pre-hashed leaves of the algorithm's width.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_merkle_root(
    algorithm: u32,
    branching: u32,
    leaves: *const u8,
    count: u64,
    out: *mut u8,
    out_len: usize,
) -> MhasherStatusC {
    run("merkle_root", || {
        let algorithm = Algorithm::from_selector(algorithm)?;
        let branching = Branching::from_selector(branching)?;
        let leaves = unsafe { fixed_digests(leaves, count, algorithm.output_len()) }?;
        let out = unsafe { output(out, out_len, "out") }?;
        let root = crate::engine().merkle_root(algorithm, branching, &leaves)?;
        write_digest(&root, out)
    })
}

// ============================================================================
// Set Algebra
// ============================================================================

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_sort(
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const u32,
    count: u32,
    indices: *mut u32,
    indices_len: usize,
) -> MhasherStatusC {
    run("sort", || {
        let records = unsafe { flat_records(bytes, bytes_len, lengths, count as usize) }?;
        let indices = unsafe { output(indices, indices_len, "indices") }?;
        write_indices_u32(&crate::engine().sort(&records), indices)
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_unique(
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const u32,
    count: u32,
    mask: *mut u8,
    mask_len: usize,
) -> MhasherStatusC {
    run("unique", || {
        let records = unsafe { flat_records(bytes, bytes_len, lengths, count as usize) }?;
        let mask = unsafe { output(mask, mask_len, "mask") }?;
        write_mask(&crate::engine().unique(&records), mask)
    })
}

/// Sorted, deduplicated indices; `out_count` receives how many were written.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_unique_sort(
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const u32,
    count: u32,
    indices: *mut u32,
    indices_len: usize,
    out_count: *mut u32,
) -> MhasherStatusC {
    run("unique_sort", || {
        let records = unsafe { flat_records(bytes, bytes_len, lengths, count as usize) }?;
        let indices = unsafe { output(indices, indices_len, "indices") }?;
        let out_count = unsafe { out_value(out_count, "out_count") }?;
        let survivors = crate::engine().unique_sort(&records);
        write_indices_u32(&survivors, indices)?;
        *out_count = survivors.len() as u32;
        Ok(())
    })
}

/// Keep mask over the base records: kept iff absent from the exclusion set.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn mhasher_remove(
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const u32,
    count: u32,
    exclude: *const u8,
    exclude_len: usize,
    exclude_lengths: *const u32,
    exclude_count: u32,
    mask: *mut u8,
    mask_len: usize,
) -> MhasherStatusC {
    run("remove", || {
        let base = unsafe { flat_records(bytes, bytes_len, lengths, count as usize) }?;
        let exclude =
            unsafe { flat_records(exclude, exclude_len, exclude_lengths, exclude_count as usize) }?;
        let mask = unsafe { output(mask, mask_len, "mask") }?;
        write_mask(&crate::engine().remove(&base, &exclude), mask)
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_sort_hash256(
    digests: *const u8,
    count: u64,
    indices: *mut u64,
    indices_len: usize,
) -> MhasherStatusC {
    run("sort_hash256", || {
        let digests = unsafe { fixed_digests(digests, count, HASH256_LEN) }?;
        let indices = unsafe { output(indices, indices_len, "indices") }?;
        let order = crate::engine().sort_hash256(&digests);
        ensure_capacity("indices", order.len(), indices.len())?;
        for (slot, &i) in indices.iter_mut().zip(&order) {
            *slot = i as u64;
        }
        Ok(())
    })
}

/// Distinct digests in ascending order, packed into `out`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_unique_hash256(
    digests: *const u8,
    count: u64,
    out: *mut u8,
    out_len: usize,
    out_count: *mut u64,
) -> MhasherStatusC {
    run("unique_hash256", || {
        let digests = unsafe { fixed_digests(digests, count, HASH256_LEN) }?;
        let out = unsafe { output(out, out_len, "out") }?;
        let out_count = unsafe { out_value(out_count, "out_count") }?;
        let unique = crate::engine().unique_hash256(&digests)?;
        write_unique_digests(&unique, out, out_count)
    })
}

/// Distinct digests in unspecified order, packed into `out`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_quick_unique_hash256(
    digests: *const u8,
    count: u64,
    out: *mut u8,
    out_len: usize,
    out_count: *mut u64,
) -> MhasherStatusC {
    run("quick_unique_hash256", || {
        let digests = unsafe { fixed_digests(digests, count, HASH256_LEN) }?;
        let out = unsafe { output(out, out_len, "out") }?;
        let out_count = unsafe { out_value(out_count, "out_count") }?;
        let unique = crate::engine().quick_unique_hash256(&digests)?;
        write_unique_digests(&unique, out, out_count)
    })
}

// ============================================================================
// Batch Sessions
// ============================================================================

/// Start a batch session. The returned id is never 0.
#[no_mangle]
pub extern "C" fn mhasher_batch_start() -> u64 {
    crate::init_logger();
    let id = sessions::open(crate::engine().start_batch());
    debug!("batch session {} opened", id);
    id
}

/// Append the records of a flat buffer to the session.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_batch_pack(
    session: u64,
    bytes: *const u8,
    bytes_len: usize,
    lengths: *const u32,
    count: u32,
) -> MhasherStatusC {
    run("batch_pack", || {
        let records = unsafe { flat_records(bytes, bytes_len, lengths, count as usize) }?;
        sessions::with_session(session, |s| s.pack(records.iter_records()).map(|_| ()))
    })
}

/// Read each file and append its contents as one record. Nothing is packed
/// unless every file could be read.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_batch_pack_paths(
    session: u64,
    paths: *const *const c_char,
    count: usize,
) -> MhasherStatusC {
    run("batch_pack_paths", || {
        let paths = unsafe { convert_string_array(paths, count) }.map_err(MhasherError::InvalidArgument)?;
        let mut contents = Vec::with_capacity(paths.len());
        for path in &paths {
            let data = std::fs::read(path).map_err(|e| MhasherError::Source(format!("{}: {}", path, e)))?;
            contents.push(data);
        }
        sessions::with_session(session, |s| s.pack(&contents).map(|_| ()))
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_batch_buffer_size(session: u64, out_size: *mut u64) -> MhasherStatusC {
    run("batch_buffer_size", || {
        let out_size = unsafe { out_value(out_size, "out_size") }?;
        *out_size = sessions::with_session(session, |s| s.buffer_size())? as u64;
        Ok(())
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_batch_record_count(session: u64, out_count: *mut u64) -> MhasherStatusC {
    run("batch_record_count", || {
        let out_count = unsafe { out_value(out_count, "out_count") }?;
        *out_count = sessions::with_session(session, |s| s.record_count())? as u64;
        Ok(())
    })
}

/// Copy the packed bytes into `out` and one length per record into
/// `out_lengths`; `out_count` receives the record count.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mhasher_batch_unpack(
    session: u64,
    out: *mut u8,
    out_len: usize,
    out_lengths: *mut u32,
    lengths_len: usize,
    out_count: *mut u32,
) -> MhasherStatusC {
    run("batch_unpack", || {
        let out = unsafe { output(out, out_len, "out") }?;
        let out_lengths = unsafe { output(out_lengths, lengths_len, "out_lengths") }?;
        let out_count = unsafe { out_value(out_count, "out_count") }?;
        let count = sessions::with_session(session, |s| s.unpack(out, out_lengths))?;
        *out_count = u32::try_from(count)
            .map_err(|_| MhasherError::InvalidArgument(format!("{} records exceed u32 count", count)))?;
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn mhasher_batch_clear(session: u64) -> MhasherStatusC {
    run("batch_clear", || sessions::with_session(session, |s| s.clear()))
}

/// Release the session's buffer and retire its id.
#[no_mangle]
pub extern "C" fn mhasher_batch_stop(session: u64) -> MhasherStatusC {
    run("batch_stop", || {
        sessions::close(session)?;
        debug!("batch session {} closed", session);
        Ok(())
    })
}
