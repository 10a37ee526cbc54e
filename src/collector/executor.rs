//! The chapter loop
//!
//! Chapters are processed in ascending order. Each chapter is fetched
//! completely (verses, then tafsirs) before any of its records enter the
//! buffer, so an API failure mid-chapter leaves the output file untouched
//! and the chapter is retried whole on the next run. Any chapter failure
//! ends the run: there is no safe partial state to continue from. The
//! buffer is drained before the error propagates.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::client::QuranApiClient;
use crate::output::{JsonlWriter, RecordWriter};
use crate::shutdown::ShutdownCoordinator;
use crate::tafsir::TafsirFetcher;
use crate::{Chapter, VerseKey};

use super::buffer::OutputBuffer;
use super::config::CollectorConfig;
use super::resume;
use super::stats::CollectorStats;
use super::{CollectorError, CollectorResult};

/// Highest chapter number.
const CHAPTER_MAX: u32 = 114;

/// How a single chapter's processing ended.
enum ChapterRun {
    /// All records written; count of records that reached the buffer
    Completed(u64),
    /// Shutdown arrived mid-chapter; count of records buffered before it
    Interrupted(u64),
}

/// Orchestrates a collection run.
#[derive(Debug)]
pub struct Collector {
    config: CollectorConfig,
    client: Arc<QuranApiClient>,
    shutdown: Option<Arc<ShutdownCoordinator>>,
}

impl Collector {
    /// Build a collector, validating the configuration and constructing
    /// the API client.
    pub fn new(config: CollectorConfig) -> CollectorResult<Self> {
        config.validate()?;
        let client = Arc::new(QuranApiClient::new(config.api.clone())?);
        Ok(Self {
            config,
            client,
            shutdown: None,
        })
    }

    /// Attach a shutdown coordinator; without one the run never stops early.
    pub fn with_shutdown(mut self, shutdown: Arc<ShutdownCoordinator>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The shared API client.
    pub fn client(&self) -> &Arc<QuranApiClient> {
        &self.client
    }

    /// Collect every chapter.
    pub async fn collect_all(&mut self) -> CollectorResult<CollectorStats> {
        let chapters = self.client.get_chapters().await?;
        self.collect_chapters(chapters).await
    }

    /// Collect an inclusive chapter range.
    pub async fn collect_range(&mut self, start: u32, end: u32) -> CollectorResult<CollectorStats> {
        if start == 0 || end > CHAPTER_MAX || start > end {
            return Err(CollectorError::InvalidRange { start, end });
        }
        let chapters: Vec<Chapter> = self
            .client
            .get_chapters()
            .await?
            .into_iter()
            .filter(|chapter| (start..=end).contains(&chapter.id))
            .collect();
        self.collect_chapters(chapters).await
    }

    /// Collect a single chapter.
    pub async fn collect_single(&mut self, chapter_id: u32) -> CollectorResult<CollectorStats> {
        if chapter_id == 0 || chapter_id > CHAPTER_MAX {
            return Err(CollectorError::InvalidChapter(chapter_id));
        }
        let chapter = self.client.get_chapter(chapter_id).await?;
        self.collect_chapters(vec![chapter]).await
    }

    /// Run the chapter loop over the given chapters.
    pub async fn collect_chapters(
        &mut self,
        mut chapters: Vec<Chapter>,
    ) -> CollectorResult<CollectorStats> {
        let mut stats = CollectorStats::default();
        chapters.sort_by_key(|chapter| chapter.id);

        let fetcher = self.build_fetcher(&mut stats).await;

        let append = self.config.resume && self.config.output_file.exists();
        let completed: HashSet<u32> = if append {
            let scan = resume::scan_output(&self.config.output_file)?;
            let completed = scan.completed_chapters(&chapters);
            info!(
                existing_records = scan.records_seen,
                complete_chapters = completed.len(),
                "Resuming from existing output"
            );
            completed
        } else {
            HashSet::new()
        };

        let mut writer = JsonlWriter::open(&self.config.output_file, append)?;
        let mut buffer = OutputBuffer::new(self.config.batch_size);

        for chapter in &chapters {
            if self.is_shutdown_requested() {
                info!(
                    next_chapter = chapter.id,
                    "Shutdown requested, stopping before next chapter"
                );
                stats.interrupted = true;
                break;
            }

            if completed.contains(&chapter.id) {
                debug!(chapter = chapter.id, "Chapter already complete, skipping");
                stats.chapters_skipped += 1;
                continue;
            }

            match self
                .process_chapter(chapter, fetcher.as_ref(), &mut buffer, &mut writer, &mut stats)
                .await
            {
                Ok(ChapterRun::Completed(written)) => {
                    stats.chapters_processed += 1;
                    stats.verses_collected += written;
                }
                Ok(ChapterRun::Interrupted(written)) => {
                    stats.verses_collected += written;
                    stats.interrupted = true;
                    break;
                }
                Err(e) => {
                    // No safe partial state to continue from; flush what
                    // already completed and abort.
                    warn!(chapter = chapter.id, error = %e, "Chapter failed, aborting run");
                    let _ = Self::drain_to_writer(&mut buffer, &mut writer);
                    return Err(e);
                }
            }
        }

        Self::drain_to_writer(&mut buffer, &mut writer)?;
        writer.close()?;

        if let Some(fetcher) = &fetcher {
            stats.absorb_fetch_stats(fetcher.stats());
        }

        if !stats.errors.is_empty() {
            let report_path = self.config.error_report_path();
            if let Err(e) = stats.save_error_report(&report_path) {
                warn!(path = %report_path.display(), error = %e, "Failed to write error report");
            }
        }

        info!(
            chapters_processed = stats.chapters_processed,
            chapters_skipped = stats.chapters_skipped,
            verses_collected = stats.verses_collected,
            errors = stats.errors.len(),
            interrupted = stats.interrupted,
            "Collection run finished"
        );
        Ok(stats)
    }

    /// Build the tafsir fetcher, resolving resource display names. Name
    /// resolution failure downgrades to id-based fallback names.
    async fn build_fetcher(&self, stats: &mut CollectorStats) -> Option<TafsirFetcher> {
        if self.config.tafsirs.is_empty() {
            return None;
        }

        let names: HashMap<u32, String> = match self.client.get_tafsirs_list().await {
            Ok(resources) => resources
                .into_iter()
                .filter(|resource| self.config.tafsirs.contains(&resource.id))
                .map(|resource| (resource.id, resource.name))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to resolve tafsir names, using ids");
                stats.record_error(None, "tafsir_resources", e.to_string());
                HashMap::new()
            }
        };

        Some(
            TafsirFetcher::new(Arc::clone(&self.client), self.config.concurrency)
                .with_resource_names(names),
        )
    }

    /// Fetch one chapter completely and push its records through the buffer.
    ///
    /// Shutdown is checked at every boundary: after the verse fetch, after
    /// the tafsir fetch, and per record during buffering. An interrupt
    /// leaves the chapter incomplete; resume re-fetches it whole.
    async fn process_chapter(
        &self,
        chapter: &Chapter,
        fetcher: Option<&TafsirFetcher>,
        buffer: &mut OutputBuffer,
        writer: &mut JsonlWriter,
        stats: &mut CollectorStats,
    ) -> CollectorResult<ChapterRun> {
        info!(
            chapter = chapter.id,
            name = %chapter.name_simple,
            verses = chapter.verses_count,
            "Collecting chapter"
        );

        let verses = self
            .client
            .get_all_verses_by_chapter(chapter.id, &self.config.translations)
            .await?;

        if self.is_shutdown_requested() {
            return Ok(ChapterRun::Interrupted(0));
        }

        let mut records = Vec::with_capacity(verses.len());
        for dto in verses {
            match dto.into_record(chapter, self.config.include_metadata) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(chapter = chapter.id, error = %e, "Dropping unparseable verse");
                    stats.record_error(Some(chapter.id), "parse", e.to_string());
                }
            }
        }

        if let Some(fetcher) = fetcher {
            let keys: Vec<VerseKey> = records.iter().map(|record| record.verse_id).collect();
            let mut tafsirs = fetcher.fetch_batch(&keys, &self.config.tafsirs).await;
            for record in &mut records {
                if let Some(texts) = tafsirs.remove(&record.verse_id) {
                    record.tafsirs = texts;
                }
            }
            if self.is_shutdown_requested() {
                return Ok(ChapterRun::Interrupted(0));
            }
        }

        let mut written = 0;
        for record in records {
            if self.is_shutdown_requested() {
                return Ok(ChapterRun::Interrupted(written));
            }
            if let Err(msg) = record.validate() {
                warn!(verse = %record.verse_id, reason = %msg, "Dropping invalid record");
                stats.record_error(Some(chapter.id), "validate", msg);
                continue;
            }
            written += 1;
            if buffer.push(record) {
                Self::drain_to_writer(buffer, writer)?;
            }
        }

        Ok(ChapterRun::Completed(written))
    }

    /// The single drain path: every buffered record reaches the writer
    /// here, followed by a flush.
    fn drain_to_writer(buffer: &mut OutputBuffer, writer: &mut JsonlWriter) -> CollectorResult<()> {
        let records = buffer.drain();
        if records.is_empty() {
            return Ok(());
        }
        debug!(records = records.len(), "Draining buffer");
        for record in &records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_shutdown_requested())
    }
}
