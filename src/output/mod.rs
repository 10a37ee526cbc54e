//! Data output writers
//!
//! The collector persists one JSON object per line (JSONL). The writer is
//! the only component that touches the output file during collection; it is
//! append-only and never rewrites earlier lines.

pub mod jsonl;

pub use jsonl::JsonlWriter;

use crate::VerseRecord;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record failed to serialize
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sink for verse records.
pub trait RecordWriter {
    /// Append one record.
    fn write_record(&mut self, record: &VerseRecord) -> Result<(), OutputError>;

    /// Flush buffered lines to the operating system.
    fn flush(&mut self) -> Result<(), OutputError>;
}
