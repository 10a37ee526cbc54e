//! Run configuration

use std::path::PathBuf;

use crate::api::client::ApiClientConfig;

use super::{CollectorError, CollectorResult};

/// Default buffer flush threshold, in records.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default requested concurrency for tafsir fetching.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default translation resource: Dr. Mustafa Khattab, the Clear Quran.
pub const DEFAULT_TRANSLATION_ID: u32 = 131;

/// Configuration for a collection run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Output JSONL path
    pub output_file: PathBuf,
    /// Error report path; defaults to `collection_errors.json` next to the
    /// output file
    pub error_file: Option<PathBuf>,
    /// Translation resource ids to embed in each record
    pub translations: Vec<u32>,
    /// Tafsir resource ids to fetch per verse; empty skips tafsir fetching
    pub tafsirs: Vec<u32>,
    /// Buffer flush threshold, in records
    pub batch_size: usize,
    /// Requested concurrency for tafsir fetching (further bounded by the
    /// client's live ceiling)
    pub concurrency: usize,
    /// Skip chapters already complete in the output file; off by default,
    /// a fresh run truncates any existing output
    pub resume: bool,
    /// Attach the positional metadata bag to each record
    pub include_metadata: bool,
    /// API client settings
    pub api: ApiClientConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("quran_data.jsonl"),
            error_file: None,
            translations: vec![DEFAULT_TRANSLATION_ID],
            tafsirs: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            resume: false,
            include_metadata: true,
            api: ApiClientConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Reject configurations that cannot produce a run.
    pub fn validate(&self) -> CollectorResult<()> {
        if self.batch_size == 0 {
            return Err(CollectorError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CollectorError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.output_file.as_os_str().is_empty() {
            return Err(CollectorError::Config(
                "output_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Where the error report goes: the configured path, or
    /// `collection_errors.json` beside the output file.
    pub fn error_report_path(&self) -> PathBuf {
        self.error_file.clone().unwrap_or_else(|| {
            self.output_file.with_file_name("collection_errors.json")
        })
    }
}
