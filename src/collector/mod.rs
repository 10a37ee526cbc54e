//! Collection orchestration
//!
//! The [`Collector`] owns a run end to end: chapter listing, resume
//! reconciliation, verse fetching, tafsir merging, size-bounded buffering,
//! and the final drain. Chapters are the unit of progress; a chapter either
//! completes or is retried whole on the next run.
//!
//! # Components
//!
//! - [`config`] - Run configuration and defaults
//! - [`buffer`] - Size-bounded record buffer with a single drain path
//! - [`resume`] - Output reconciliation for chapter-level resume
//! - [`stats`] - Run counters and the error report
//! - [`executor`] - The chapter loop itself

pub mod buffer;
pub mod config;
pub mod executor;
pub mod resume;
pub mod stats;

pub use buffer::OutputBuffer;
pub use config::CollectorConfig;
pub use executor::Collector;
pub use stats::{CollectionError, CollectorStats};

use crate::api::ApiError;
use crate::output::OutputError;

/// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// API failure that aborts the run (e.g. the chapter list itself)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Output file failure; collection cannot continue without the sink
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Filesystem error outside the output writer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Chapter number outside 1-114
    #[error("invalid chapter {0}: must be in 1-114")]
    InvalidChapter(u32),

    /// Malformed chapter range
    #[error("invalid chapter range {start}-{end}")]
    InvalidRange {
        /// Range start
        start: u32,
        /// Range end
        end: u32,
    },
}

/// Result type for collector operations
pub type CollectorResult<T> = Result<T, CollectorError>;
