//! Parallel tafsir fetching
//!
//! Fans the cross product of verse keys and tafsir ids out over a bounded
//! pool of concurrent requests. The pool is sized from the client's live
//! concurrency ceiling at the start of every batch, so a circuit-breaker
//! trip mid-run shrinks the next batch automatically. Individual fetch
//! failures are counted and logged, never propagated; one broken commentary
//! must not sink a chapter.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::api::client::QuranApiClient;
use crate::api::ApiError;
use crate::VerseKey;

/// Lower bound on pool size; a tripped breaker still makes progress.
const MIN_CONCURRENCY: usize = 1;

/// Upper bound on pool size regardless of what the caller requests.
const MAX_CONCURRENCY: usize = 10;

/// Counters accumulated across every batch of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Fetch tasks started
    pub attempted: u64,
    /// Tasks that returned commentary text
    pub succeeded: u64,
    /// Tasks that failed with an API error
    pub failed: u64,
    /// Tasks where the commentary does not exist
    pub not_found: u64,
}

/// Outcome of a single (verse, tafsir) fetch.
#[derive(Debug)]
enum TafsirOutcome {
    Text(String),
    Missing,
    Failed(ApiError),
}

/// Fetches tafsir commentary for batches of verses in parallel.
#[derive(Debug)]
pub struct TafsirFetcher {
    client: Arc<QuranApiClient>,
    requested_concurrency: usize,
    resource_names: HashMap<u32, String>,
    stats: Mutex<FetchStats>,
}

impl TafsirFetcher {
    /// Create a fetcher sharing the given client.
    ///
    /// `requested_concurrency` is the caller's ceiling; the effective pool
    /// size per batch is further bounded by the client's live ceiling and
    /// by [`MAX_CONCURRENCY`].
    pub fn new(client: Arc<QuranApiClient>, requested_concurrency: usize) -> Self {
        Self {
            client,
            requested_concurrency,
            resource_names: HashMap::new(),
            stats: Mutex::new(FetchStats::default()),
        }
    }

    /// Attach id → display-name mappings for the requested tafsirs. Ids
    /// without a mapping fall back to `tafsir_{id}` in the output.
    pub fn with_resource_names(mut self, names: HashMap<u32, String>) -> Self {
        self.resource_names = names;
        self
    }

    /// Pool size for the next batch, read from the client's live ceiling.
    pub fn batch_concurrency(&self) -> usize {
        effective_concurrency(self.client.get_concurrency(), self.requested_concurrency)
    }

    /// Accumulated counters.
    pub fn stats(&self) -> FetchStats {
        *self.lock_stats()
    }

    /// Zero the counters, e.g. between collection phases.
    pub fn reset_stats(&self) {
        *self.lock_stats() = FetchStats::default();
    }

    /// Fetch all requested tafsirs for a batch of verses.
    ///
    /// Returns commentary keyed by verse, then by tafsir display name. The
    /// map covers every input key; a verse with no commentary at all maps
    /// to an empty inner map. Completes only when every task in the batch
    /// has finished.
    pub async fn fetch_batch(
        &self,
        verse_keys: &[VerseKey],
        tafsir_ids: &[u32],
    ) -> HashMap<VerseKey, BTreeMap<String, String>> {
        let mut result: HashMap<VerseKey, BTreeMap<String, String>> = verse_keys
            .iter()
            .map(|&key| (key, BTreeMap::new()))
            .collect();
        if verse_keys.is_empty() || tafsir_ids.is_empty() {
            return result;
        }

        let workers = self.batch_concurrency();
        debug!(
            verses = verse_keys.len(),
            tafsirs = tafsir_ids.len(),
            workers,
            "Fetching tafsir batch"
        );

        let tasks: Vec<(VerseKey, u32)> = verse_keys
            .iter()
            .flat_map(|&key| tafsir_ids.iter().map(move |&id| (key, id)))
            .collect();

        let outcomes: Vec<(VerseKey, u32, TafsirOutcome)> = stream::iter(tasks)
            .map(|(key, id)| {
                let client = Arc::clone(&self.client);
                async move {
                    let outcome = match client.get_tafsir_by_ayah(id, key).await {
                        Ok(Some(text)) => TafsirOutcome::Text(text),
                        Ok(None) => TafsirOutcome::Missing,
                        Err(e) => TafsirOutcome::Failed(e),
                    };
                    (key, id, outcome)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut batch = FetchStats::default();

        for (key, id, outcome) in outcomes {
            batch.attempted += 1;
            match outcome {
                TafsirOutcome::Text(text) => {
                    batch.succeeded += 1;
                    result
                        .entry(key)
                        .or_default()
                        .insert(self.display_name(id), text);
                }
                TafsirOutcome::Missing => batch.not_found += 1,
                TafsirOutcome::Failed(e) => {
                    batch.failed += 1;
                    warn!(verse = %key, tafsir_id = id, error = %e, "Tafsir fetch failed");
                }
            }
        }

        let mut stats = self.lock_stats();
        stats.attempted += batch.attempted;
        stats.succeeded += batch.succeeded;
        stats.failed += batch.failed;
        stats.not_found += batch.not_found;

        result
    }

    fn display_name(&self, tafsir_id: u32) -> String {
        self.resource_names
            .get(&tafsir_id)
            .cloned()
            .unwrap_or_else(|| format!("tafsir_{tafsir_id}"))
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, FetchStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clamp the live ceiling into `[MIN_CONCURRENCY, min(requested, MAX)]`.
fn effective_concurrency(live: usize, requested: usize) -> usize {
    let upper = requested.min(MAX_CONCURRENCY).max(MIN_CONCURRENCY);
    live.clamp(MIN_CONCURRENCY, upper)
}
