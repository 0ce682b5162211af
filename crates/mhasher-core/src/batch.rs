//! Batch buffer engine.
//!
//! A `BatchSession` packs many byte sequences into one contiguous buffer so
//! they can be handed to the other engines in a single call, and unpacks the
//! buffer back into caller memory with one length per record.
//!
//! Sessions are single-owner and not internally synchronised. After `stop`
//! the buffer is released and every further operation fails with
//! `SessionStopped`.

use std::io::Read;

use log::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{MhasherError, MhasherResult};
use crate::records::{RecordCollection, Records};

/// Session-scoped packer owning one record buffer
#[derive(Debug)]
pub struct BatchSession {
    records: RecordCollection<'static>,
    max_bytes: usize,
    stopped: bool,
}

impl BatchSession {
    /// Start a session with default limits
    pub fn start() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        debug!("batch session started (limit {} bytes)", config.max_batch_bytes);
        Self {
            records: RecordCollection::new(),
            max_bytes: config.max_batch_bytes,
            stopped: false,
        }
    }

    fn ensure_live(&self) -> MhasherResult<()> {
        if self.stopped {
            Err(MhasherError::SessionStopped)
        } else {
            Ok(())
        }
    }

    fn ensure_room(&self, additional: usize) -> MhasherResult<()> {
        let requested = self.records.total_bytes().saturating_add(additional);
        if requested > self.max_bytes {
            return Err(MhasherError::ResourceExhausted { requested });
        }
        Ok(())
    }

    /// Append each source as one record. Returns the number of records added.
    ///
    /// Fails without packing anything if the sources would exceed the
    /// session's byte ceiling.
    pub fn pack<I, B>(&mut self, sources: I) -> MhasherResult<usize>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        self.ensure_live()?;
        let sources: Vec<B> = sources.into_iter().collect();
        let incoming: usize = sources.iter().map(|s| s.as_ref().len()).sum();
        self.ensure_room(incoming)?;
        self.records.reserve(sources.len(), incoming)?;

        let before = self.records.len();
        for source in &sources {
            if let Err(e) = self.records.push(source.as_ref()) {
                self.records.truncate(before);
                return Err(e);
            }
        }
        trace!(
            "packed {} sources ({} bytes), session now {} bytes",
            sources.len(),
            incoming,
            self.records.total_bytes()
        );
        Ok(sources.len())
    }

    /// Drain `reader` into one new record. Returns the record's length.
    pub fn pack_reader<R: Read>(&mut self, mut reader: R) -> MhasherResult<usize> {
        self.ensure_live()?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| MhasherError::Source(e.to_string()))?;
        self.ensure_room(buf.len())?;
        self.records.push(&buf)?;
        Ok(buf.len())
    }

    /// Total packed bytes
    pub fn buffer_size(&self) -> MhasherResult<usize> {
        self.ensure_live()?;
        Ok(self.records.total_bytes())
    }

    /// Number of packed records
    pub fn record_count(&self) -> MhasherResult<usize> {
        self.ensure_live()?;
        Ok(self.records.len())
    }

    /// Borrow the packed records, e.g. to sort or hash them in place.
    pub fn records(&self) -> MhasherResult<&RecordCollection<'static>> {
        self.ensure_live()?;
        Ok(&self.records)
    }

    /// Copy the packed bytes into `out` and one length per record into
    /// `out_lengths`. Returns the record count.
    ///
    /// Records are delimited by the session's own length vector.
    pub fn unpack(&self, out: &mut [u8], out_lengths: &mut [u32]) -> MhasherResult<usize> {
        self.ensure_live()?;
        let bytes = self.records.as_bytes();
        if out.len() < bytes.len() {
            return Err(MhasherError::BufferTooSmall {
                what: "unpack buffer",
                needed: bytes.len(),
                available: out.len(),
            });
        }
        let count = self.records.len();
        if out_lengths.len() < count {
            return Err(MhasherError::BufferTooSmall {
                what: "unpack length array",
                needed: count,
                available: out_lengths.len(),
            });
        }

        for (slot, len) in out_lengths.iter_mut().zip(self.records.lengths()) {
            *slot = u32::try_from(len).map_err(|_| {
                MhasherError::InvalidArgument(format!("record of {} bytes exceeds u32 length", len))
            })?;
        }
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(count)
    }

    /// Discard packed content; the session stays usable.
    pub fn clear(&mut self) -> MhasherResult<()> {
        self.ensure_live()?;
        self.records.clear();
        debug!("batch session cleared");
        Ok(())
    }

    /// Release the buffer and invalidate the session. Stopping twice is a
    /// contract violation.
    pub fn stop(&mut self) -> MhasherResult<()> {
        self.ensure_live()?;
        self.records.release();
        self.stopped = true;
        debug!("batch session stopped");
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Default for BatchSession {
    fn default() -> Self {
        Self::start()
    }
}
