//! # Quran Data Collector Library
//!
//! A resilient library for collecting Quran verses, translations and tafsir
//! commentary from the Quran Foundation API and persisting them to an
//! append-only JSONL store.
//!
//! ## Features
//!
//! - **Rate Limiting**: Process-wide minimum delay between API requests
//! - **Circuit Breaker**: Detects sustained throttling, pauses, and lowers
//!   its own concurrency ceiling until explicitly reset
//! - **Parallel Tafsir Fetching**: Bounded worker pool sized from the live
//!   concurrency ceiling, so a mid-run trip shrinks the next batch
//! - **Resume Capability**: Chapter-level resume by reconciling existing
//!   output against expected verse counts
//! - **Graceful Shutdown**: Ctrl+C finishes in-flight work and flushes the
//!   output buffer before exiting
//!
//! ## Quick Start
//!
//! ```no_run
//! use quran_data_collector::collector::{Collector, CollectorConfig};
//! use quran_data_collector::shutdown::ShutdownCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CollectorConfig {
//!     output_file: "quran_data.jsonl".into(),
//!     translations: vec![131, 85],
//!     tafsirs: vec![169],
//!     ..CollectorConfig::default()
//! };
//!
//! let mut collector = Collector::new(config)?.with_shutdown(ShutdownCoordinator::shared());
//! let stats = collector.collect_all().await?;
//! println!("{} verses collected", stats.verses_collected);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`api`] - API client with rate limiting, circuit breaker, and pagination
//! - [`tafsir`] - Parallel tafsir fetcher bounded by the client's concurrency
//! - [`collector`] - Orchestration: chapter loop, buffering, resume, drain
//! - [`output`] - JSONL output writer
//! - [`shutdown`] - Graceful shutdown coordination

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// API client with rate limiting and circuit breaker
pub mod api;

/// CLI command implementations
pub mod cli;

/// Collection orchestration
pub mod collector;

/// Data output writers
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Parallel tafsir fetching
pub mod tafsir;

// Re-export commonly used types
pub use api::client::QuranApiClient;

/// Error returned when a verse key fails to parse
#[derive(Debug, thiserror::Error)]
#[error("invalid verse key '{input}': expected '{{chapter}}:{{verse}}' with positive integers")]
pub struct VerseKeyError {
    /// The rejected input
    pub input: String,
}

/// Composite key addressing a single verse: `"{chapter}:{verse}"`.
///
/// Both parts are positive integers. Keys order first by chapter, then by
/// verse number, which matches the order records appear in the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseKey {
    /// Chapter (surah) number
    pub chapter: u32,
    /// Verse (ayah) number within the chapter
    pub verse: u32,
}

impl VerseKey {
    /// Create a new verse key
    pub fn new(chapter: u32, verse: u32) -> Self {
        Self { chapter, verse }
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

impl FromStr for VerseKey {
    type Err = VerseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VerseKeyError {
            input: s.to_string(),
        };

        let (chapter, verse) = s.split_once(':').ok_or_else(invalid)?;
        let chapter: u32 = chapter.parse().map_err(|_| invalid())?;
        let verse: u32 = verse.parse().map_err(|_| invalid())?;

        if chapter == 0 || verse == 0 {
            return Err(invalid());
        }

        Ok(Self { chapter, verse })
    }
}

impl Serialize for VerseKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerseKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Chapter (surah) metadata from the API.
///
/// Immutable once fetched; cached for the duration of a run. The
/// `verses_count` field is the expected child count used by resume
/// reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    /// Chapter number (1-114), externally assigned and stable
    pub id: u32,
    /// Simple transliterated name (e.g., "Al-Fatihah")
    pub name_simple: String,
    /// Arabic name
    #[serde(default)]
    pub name_arabic: String,
    /// Expected number of verses in this chapter
    pub verses_count: usize,
    /// Place of revelation ("makkah" or "madinah"), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revelation_place: Option<String>,
    /// Chronological revelation order, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revelation_order: Option<u32>,
}

impl Chapter {
    /// Validate chapter data integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.id == 0 || self.id > 114 {
            return Err(format!("Chapter id must be in 1-114, got {}", self.id));
        }

        if self.name_simple.is_empty() {
            return Err("Chapter name cannot be empty".to_string());
        }

        if self.verses_count == 0 {
            return Err(format!(
                "Chapter {} must have a positive verse count",
                self.id
            ));
        }

        Ok(())
    }
}

/// Optional per-verse metadata bag (flat key → scalar mapping).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerseMetadata {
    /// Juz number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juz: Option<u32>,
    /// Mushaf page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Hizb number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hizb: Option<u32>,
    /// Rub el hizb number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rub_el_hizb: Option<u32>,
    /// Ruku number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruku: Option<u32>,
    /// Manzil number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manzil: Option<u32>,
    /// Sajdah number, present only for verses of prostration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sajdah: Option<u32>,
    /// Place of revelation, copied from the chapter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revelation_place: Option<String>,
    /// Revelation order, copied from the chapter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revelation_order: Option<u32>,
}

/// One persisted output record: a verse with its translations and tafsirs.
///
/// Written exactly once per key, one JSON object per line. `BTreeMap` keeps
/// the name → text mappings in a deterministic order so repeated runs over
/// the same inputs produce byte-identical records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerseRecord {
    /// Composite verse key, `"{chapter}:{verse}"`
    pub verse_id: VerseKey,
    /// Chapter (surah) number
    pub surah_number: u32,
    /// Verse (ayah) number
    pub verse_number: u32,
    /// Simple chapter name
    pub surah_name: String,
    /// Arabic chapter name
    pub surah_name_arabic: String,
    /// Primary Arabic text (Uthmani script)
    pub arabic_text: String,
    /// Translation name → translated text
    pub translations: BTreeMap<String, String>,
    /// Tafsir name → commentary text; empty when none were requested or found
    pub tafsirs: BTreeMap<String, String>,
    /// Optional metadata bag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VerseMetadata>,
}

impl VerseRecord {
    /// Validate record integrity before buffering
    pub fn validate(&self) -> Result<(), String> {
        if self.verse_id.chapter != self.surah_number {
            return Err(format!(
                "Verse key chapter ({}) does not match surah_number ({})",
                self.verse_id.chapter, self.surah_number
            ));
        }

        if self.verse_id.verse != self.verse_number {
            return Err(format!(
                "Verse key number ({}) does not match verse_number ({})",
                self.verse_id.verse, self.verse_number
            ));
        }

        if self.arabic_text.is_empty() {
            return Err(format!("Verse {} has empty Arabic text", self.verse_id));
        }

        Ok(())
    }
}

/// A translation or tafsir resource listing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceInfo {
    /// Resource id used in API requests
    pub id: u32,
    /// Human-readable resource name
    pub name: String,
    /// Language name (e.g., "english"), when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Author name, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}
