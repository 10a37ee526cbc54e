//! Size-bounded record buffer
//!
//! Records accumulate here until the buffer reaches capacity; the executor
//! then drains the whole batch to the writer in one pass. Every record
//! leaves through [`OutputBuffer::drain`], whether the trigger was a full
//! buffer, end of run, or shutdown.

use crate::VerseRecord;

/// Accumulates records up to a fixed flush threshold.
#[derive(Debug)]
pub struct OutputBuffer {
    records: Vec<VerseRecord>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create a buffer that reports full at `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Flush threshold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered record count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the buffer holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the buffer has reached its flush threshold.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Add a record; returns true when the buffer is now due for a drain.
    pub fn push(&mut self, record: VerseRecord) -> bool {
        self.records.push(record);
        self.is_full()
    }

    /// Take every buffered record, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<VerseRecord> {
        std::mem::take(&mut self.records)
    }
}
