//! Registry of live batch sessions addressed by opaque ids.
//!
//! C callers never hold a pointer to a session. Ids are non-zero and never
//! reused, so a stopped or forged id resolves to nothing instead of freed
//! memory.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use lazy_static::lazy_static;
use parking_lot::Mutex;

use mhasher_core::{BatchSession, MhasherError, MhasherResult};

lazy_static! {
    static ref SESSIONS: Mutex<AHashMap<u64, Arc<Mutex<BatchSession>>>> =
        Mutex::new(AHashMap::new());
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Register a session and return its id
pub(crate) fn open(session: BatchSession) -> u64 {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    SESSIONS.lock().insert(id, Arc::new(Mutex::new(session)));
    id
}

fn lookup(id: u64) -> MhasherResult<Arc<Mutex<BatchSession>>> {
    SESSIONS
        .lock()
        .get(&id)
        .cloned()
        .ok_or(MhasherError::SessionStopped)
}

/// Run `f` against the session behind `id`.
///
/// Only the session itself stays locked while `f` runs, so distinct
/// sessions never wait on each other.
pub(crate) fn with_session<T, F>(id: u64, f: F) -> MhasherResult<T>
where
    F: FnOnce(&mut BatchSession) -> MhasherResult<T>,
{
    let session = lookup(id)?;
    let mut guard = session.lock();
    f(&mut guard)
}

/// Stop the session and forget its id.
pub(crate) fn close(id: u64) -> MhasherResult<()> {
    let session = SESSIONS
        .lock()
        .remove(&id)
        .ok_or(MhasherError::SessionStopped)?;
    let mut guard = session.lock();
    guard.stop()
}

#[cfg(test)]
pub(crate) fn is_open(id: u64) -> bool {
    SESSIONS.lock().contains_key(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let id = open(BatchSession::start());
        assert_ne!(id, 0);
        assert!(is_open(id));

        close(id).unwrap();
        assert!(!is_open(id));
        assert_eq!(close(id), Err(MhasherError::SessionStopped));
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = open(BatchSession::start());
        let b = open(BatchSession::start());
        assert_ne!(a, b);
        close(a).unwrap();
        close(b).unwrap();
    }

    #[test]
    fn test_with_session_mutates() {
        let id = open(BatchSession::start());
        with_session(id, |s| s.pack(["12345"])).unwrap();
        let size = with_session(id, |s| s.buffer_size()).unwrap();
        assert_eq!(size, 5);
        close(id).unwrap();

        assert_eq!(
            with_session(id, |s| s.buffer_size()),
            Err(MhasherError::SessionStopped)
        );
    }

    #[test]
    fn test_unknown_id() {
        assert!(with_session(0, |s| s.clear()).is_err());
    }
}
