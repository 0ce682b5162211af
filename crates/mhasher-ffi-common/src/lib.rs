//! Common FFI utilities for the mhasher C interface.
//!
//! Helpers for turning caller-owned raw buffers into slices, moving strings
//! across the boundary, and stamping out the boilerplate exports every C
//! surface needs.
//!
//! # Memory Ownership
//!
//! - Input and output buffers stay owned by the caller; helpers only borrow
//! - Functions returning `*mut c_char` transfer ownership to the caller
//! - Callers must use the matching status free export to deallocate
//! - NULL pointers are handled safely (no-op for free functions)

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::slice;

/// Convert a Rust string to a C string pointer, with a fallback on failure.
///
/// If the input contains null bytes, returns the fallback string instead.
/// The returned pointer is owned by the caller and must be freed.
///
/// # Example
/// ```
/// use mhasher_ffi_common::{cstring_new_or_fallback, free_cstring};
///
/// let ptr = cstring_new_or_fallback("hello", "error");
/// unsafe { free_cstring(ptr) };
/// ```
#[inline]
pub fn cstring_new_or_fallback(s: &str, fallback: &'static str) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(_) => CString::new(fallback).unwrap_or_default().into_raw(),
    }
}

/// Safely free a C string pointer.
///
/// Does nothing if the pointer is null.
///
/// # Safety
/// The pointer must have been allocated by `CString::into_raw()` or be null.
#[inline]
pub unsafe fn free_cstring(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

/// Borrow `len` elements starting at `ptr`.
///
/// A null pointer is accepted only when `len` is zero; otherwise the error
/// carries `what` so the caller can name the offending argument.
///
/// # Safety
/// When non-null, `ptr` must be valid for reads of `len` elements for `'a`.
#[inline]
pub unsafe fn slice_from_raw<'a, T>(
    ptr: *const T,
    len: usize,
    what: &'static str,
) -> Result<&'a [T], &'static str> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(what);
    }
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Mutable counterpart of `slice_from_raw` for caller-provided output space.
///
/// # Safety
/// When non-null, `ptr` must be valid for writes of `len` elements for `'a`
/// and must not alias any other live slice.
#[inline]
pub unsafe fn slice_from_raw_mut<'a, T>(
    ptr: *mut T,
    len: usize,
    what: &'static str,
) -> Result<&'a mut [T], &'static str> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(what);
    }
    Ok(unsafe { slice::from_raw_parts_mut(ptr, len) })
}

/// Convert a C string array to a Vec<String>.
///
/// # Returns
/// `Ok(Vec<String>)` on success, `Err(String)` with error message on failure.
///
/// # Safety
/// - `arr` must point to `len` valid C string pointers, or be null (if len is 0)
/// - Each string pointer must be valid and null-terminated
pub unsafe fn convert_string_array(
    arr: *const *const c_char,
    len: usize,
) -> Result<Vec<String>, String> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if arr.is_null() {
        return Err("null string array".to_string());
    }

    let ptrs = unsafe { slice::from_raw_parts(arr, len) };
    let mut result = Vec::with_capacity(len);

    for (i, &ptr) in ptrs.iter().enumerate() {
        if ptr.is_null() {
            return Err(format!("null string at index {}", i));
        }
        match unsafe { CStr::from_ptr(ptr) }.to_str() {
            Ok(s) => result.push(s.to_string()),
            Err(_) => return Err(format!("invalid UTF-8 at index {}", i)),
        }
    }

    Ok(result)
}

/// Safely convert a C string pointer to a Rust string reference.
///
/// # Safety
/// The pointer must be valid and null-terminated, or null.
pub unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Result<&'a str, &'static str> {
    if ptr.is_null() {
        return Err("null pointer");
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| "invalid UTF-8")
}

/// Trait for FFI status types with standardized error handling.
///
/// Implementors get `.error(code, msg)`, which converts the message to a C
/// string with fallback handling.
///
/// # Example
/// ```ignore
/// #[repr(C)]
/// pub struct MyStatusC {
///     pub success: bool,
///     pub error_code: i32,
///     pub error_msg: *mut c_char,
/// }
///
/// impl FfiResult for MyStatusC {
///     const ERROR_FALLBACK: &'static str = "unknown error";
///
///     fn error_fields(error_code: i32, error_msg: *mut c_char) -> Self {
///         Self { success: false, error_code, error_msg }
///     }
/// }
///
/// let status = MyStatusC::error(1, "operation failed");
/// ```
pub trait FfiResult: Sized {
    /// Fallback message used when the error message contains null bytes.
    const ERROR_FALLBACK: &'static str;

    /// Construct the result struct in its error state from an
    /// already-allocated message pointer.
    fn error_fields(error_code: i32, error_msg: *mut c_char) -> Self;

    /// Create an error result with the given code and message.
    #[inline]
    fn error(error_code: i32, msg: &str) -> Self {
        let error_msg = cstring_new_or_fallback(msg, Self::ERROR_FALLBACK);
        Self::error_fields(error_code, error_msg)
    }
}

/// Generate a version function that returns a static C string.
///
/// # Example
/// ```ignore
/// mhasher_ffi_common::define_version_fn!(my_lib_version);
/// // Expands to:
/// // #[no_mangle]
/// // pub extern "C" fn my_lib_version() -> *const c_char {
/// //     concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
/// // }
/// ```
#[macro_export]
macro_rules! define_version_fn {
    ($fn_name:ident) => {
        #[no_mangle]
        pub extern "C" fn $fn_name() -> *const std::os::raw::c_char {
            concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const std::os::raw::c_char
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_cstring_new_or_fallback() {
        let ptr = cstring_new_or_fallback("hello", "fallback");
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap();
        assert_eq!(s, "hello");
        unsafe { free_cstring(ptr) };
    }

    #[test]
    fn test_cstring_with_null_bytes_uses_fallback() {
        let ptr = cstring_new_or_fallback("hel\0lo", "fallback");
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap();
        assert_eq!(s, "fallback");
        unsafe { free_cstring(ptr) };
    }

    #[test]
    fn test_free_cstring_null_is_safe() {
        unsafe { free_cstring(ptr::null_mut()) };
    }

    #[test]
    fn test_slice_from_raw_null_with_zero_len() {
        let s = unsafe { slice_from_raw::<u8>(ptr::null(), 0, "data") }.unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_slice_from_raw_null_with_len_names_argument() {
        let err = unsafe { slice_from_raw::<u32>(ptr::null(), 3, "lengths") }.unwrap_err();
        assert_eq!(err, "lengths");
    }

    #[test]
    fn test_slice_from_raw_valid() {
        let data = [1u8, 2, 3, 4];
        let s = unsafe { slice_from_raw(data.as_ptr(), 3, "data") }.unwrap();
        assert_eq!(s, &[1, 2, 3]);
    }

    #[test]
    fn test_slice_from_raw_mut_writes_through() {
        let mut out = [0u64; 2];
        {
            let s = unsafe { slice_from_raw_mut(out.as_mut_ptr(), 2, "out") }.unwrap();
            s[1] = 9;
        }
        assert_eq!(out, [0, 9]);
        assert!(unsafe { slice_from_raw_mut::<u64>(ptr::null_mut(), 1, "out") }.is_err());
    }

    #[test]
    fn test_convert_string_array_empty() {
        let result = unsafe { convert_string_array(ptr::null(), 0) };
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_convert_string_array_null_with_len() {
        let result = unsafe { convert_string_array(ptr::null(), 2) };
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_string_array_valid() {
        let strings = [
            CString::new("/tmp/a.bin").unwrap(),
            CString::new("/tmp/b.bin").unwrap(),
        ];
        let ptrs: Vec<*const c_char> = strings.iter().map(|s| s.as_ptr()).collect();

        let vec = unsafe { convert_string_array(ptrs.as_ptr(), ptrs.len()) }.unwrap();
        assert_eq!(vec, vec!["/tmp/a.bin", "/tmp/b.bin"]);
    }

    #[test]
    fn test_cstr_to_str() {
        assert_eq!(unsafe { cstr_to_str(ptr::null()) }, Err("null pointer"));
        let s = CString::new("{}").unwrap();
        assert_eq!(unsafe { cstr_to_str(s.as_ptr()) }, Ok("{}"));
    }

    struct Status {
        code: i32,
        msg: *mut c_char,
    }

    impl FfiResult for Status {
        const ERROR_FALLBACK: &'static str = "fallback";

        fn error_fields(error_code: i32, error_msg: *mut c_char) -> Self {
            Self {
                code: error_code,
                msg: error_msg,
            }
        }
    }

    #[test]
    fn test_ffi_result_error() {
        let status = Status::error(2, "bad\0msg");
        assert_eq!(status.code, 2);
        let s = unsafe { CStr::from_ptr(status.msg) }.to_str().unwrap();
        assert_eq!(s, "fallback");
        unsafe { free_cstring(status.msg) };
    }
}
