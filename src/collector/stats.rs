//! Run counters and the error report
//!
//! Stats are best-effort observability: they never gate control flow. The
//! error report is written at the end of a run whenever any non-fatal
//! errors were recorded, so partial failures leave an inspectable trail.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::tafsir::FetchStats;

/// One non-fatal error recorded during a run.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionError {
    /// Chapter being processed, when the error was chapter-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    /// Stage that failed (e.g. "verses", "tafsir_resources")
    pub stage: String,
    /// Error text
    pub message: String,
    /// When the error was recorded
    pub timestamp: DateTime<Utc>,
}

impl CollectionError {
    /// Record an error at the given stage.
    pub fn new(chapter: Option<u32>, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            chapter,
            stage: stage.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Counters for one collection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectorStats {
    /// Chapters fetched and written this run
    pub chapters_processed: u64,
    /// Chapters skipped as already complete
    pub chapters_skipped: u64,
    /// Verse records written this run
    pub verses_collected: u64,
    /// Tafsir fetch attempts
    pub tafsirs_attempted: u64,
    /// Tafsir fetches that returned text
    pub tafsirs_fetched: u64,
    /// Tafsir fetches where no commentary exists
    pub tafsirs_missing: u64,
    /// Tafsir fetches that failed
    pub tafsirs_failed: u64,
    /// Whether the run stopped early on a shutdown request
    pub interrupted: bool,
    /// Non-fatal errors recorded during the run
    pub errors: Vec<CollectionError>,
}

impl CollectorStats {
    /// Record a non-fatal error.
    pub fn record_error(
        &mut self,
        chapter: Option<u32>,
        stage: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(CollectionError::new(chapter, stage, message));
    }

    /// Fold in the tafsir fetcher's counters.
    pub fn absorb_fetch_stats(&mut self, fetch: FetchStats) {
        self.tafsirs_attempted += fetch.attempted;
        self.tafsirs_fetched += fetch.succeeded;
        self.tafsirs_missing += fetch.not_found;
        self.tafsirs_failed += fetch.failed;
    }

    /// Write the error report as pretty JSON. No-op when no errors were
    /// recorded.
    pub fn save_error_report(&self, path: &Path) -> std::io::Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.errors)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!(
            path = %path.display(),
            errors = self.errors.len(),
            "Wrote error report"
        );
        Ok(())
    }
}
