//! Typed client for the Quran Foundation content API
//!
//! Every operation funnels through one iterative request loop:
//! breaker gate, rate-limiter turn, transport send with bounded retry for
//! transient server errors, then 429 absorption. Throttling responses are
//! handled in place and never surfaced to callers unless an explicit retry
//! cap is configured.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{Chapter, ResourceInfo, VerseKey};

use super::circuit_breaker::{CircuitBreaker, CircuitSnapshot};
use super::rate_limit::RateLimiter;
use super::types::{
    ChapterResponse, ChaptersResponse, TafsirResponse, TafsirsResponse, TranslationsResponse,
    VerseDto, VersesResponse,
};
use super::{ApiError, ApiResult};

/// Base delay for transient-error backoff; doubles per attempt.
const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Longest single sleep while polling an open breaker.
const BREAKER_POLL_MAX: Duration = Duration::from_secs(5);

/// Exponent cap for pre-trip 429 backoff (2^6 = 64s).
const RATE_LIMIT_BACKOFF_MAX_EXP: u32 = 6;

/// Hard ceiling on pages traversed for a single chapter. The longest
/// chapter is 286 verses, 6 pages at the default page size; hitting this
/// guard means the server's pagination cursor is broken.
const MAX_PAGES_PER_CHAPTER: u32 = 50;

/// Page size for verse listing requests (API maximum).
const VERSES_PER_PAGE: u32 = 50;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the content API
    pub base_url: String,
    /// Minimum gap between any two requests
    pub request_delay: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Full-request timeout
    pub request_timeout: Duration,
    /// Retry budget for network errors and 502/503/504 responses
    pub max_retries: u32,
    /// Initial concurrency ceiling advertised to worker pools
    pub concurrency: usize,
    /// Consecutive 429s that trip the circuit breaker
    pub failure_threshold: u32,
    /// How long a tripped breaker blocks requests
    pub cooldown: Duration,
    /// Cap on 429 retries per request; `None` retries indefinitely
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.quran.com/api/v4".to_string(),
            request_delay: Duration::from_millis(300),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            concurrency: 3,
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
            max_rate_limit_retries: None,
        }
    }
}

/// HTTP client wrapping the content API with rate limiting and a circuit
/// breaker. Cheap to share: clone the `Arc` it usually lives in.
#[derive(Debug)]
pub struct QuranApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    rate_limiter: RateLimiter,
    breaker: CircuitBreaker,
}

impl QuranApiClient {
    /// Build a client from the given configuration.
    pub fn new(config: ApiClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.concurrency)
            .build()
            .map_err(|e| ApiError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rate_limiter: RateLimiter::new(config.request_delay),
            breaker: CircuitBreaker::new(
                config.failure_threshold,
                config.cooldown,
                config.concurrency,
            ),
            http,
            config,
        })
    }

    /// Client with default configuration.
    pub fn with_defaults() -> ApiResult<Self> {
        Self::new(ApiClientConfig::default())
    }

    /// The active configuration.
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Current concurrency ceiling, as adjusted by the circuit breaker.
    /// Worker pools re-read this before sizing each batch.
    pub fn get_concurrency(&self) -> usize {
        self.breaker.get_concurrency()
    }

    /// Snapshot of the circuit breaker for diagnostics.
    pub fn circuit_snapshot(&self) -> CircuitSnapshot {
        self.breaker.snapshot()
    }

    /// Reset the circuit breaker, restoring the original concurrency ceiling.
    pub fn reset_breaker(&self) {
        self.breaker.reset();
    }

    /// List all chapters.
    pub async fn get_chapters(&self) -> ApiResult<Vec<Chapter>> {
        let response: ChaptersResponse = self.get_json("chapters", &[]).await?;
        Ok(response.chapters.into_iter().map(Chapter::from).collect())
    }

    /// Fetch a single chapter by number.
    pub async fn get_chapter(&self, chapter_id: u32) -> ApiResult<Chapter> {
        let response: ChapterResponse = self
            .get_json(&format!("chapters/{chapter_id}"), &[])
            .await?;
        Ok(response.chapter.into())
    }

    /// Fetch one page of verses for a chapter.
    pub async fn get_verses_page(
        &self,
        chapter_id: u32,
        page: u32,
        translations: &[u32],
    ) -> ApiResult<VersesResponse> {
        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), VERSES_PER_PAGE.to_string()),
            ("fields".to_string(), "text_uthmani".to_string()),
            ("words".to_string(), "false".to_string()),
        ];
        if !translations.is_empty() {
            let ids: Vec<String> = translations.iter().map(|id| id.to_string()).collect();
            query.push(("translations".to_string(), ids.join(",")));
        }

        self.get_json(&format!("verses/by_chapter/{chapter_id}"), &query)
            .await
    }

    /// Fetch every verse of a chapter, following the pagination cursor
    /// until `next_page` is absent.
    pub async fn get_all_verses_by_chapter(
        &self,
        chapter_id: u32,
        translations: &[u32],
    ) -> ApiResult<Vec<VerseDto>> {
        let mut verses = Vec::new();
        let mut page = 1;
        let mut pages_seen = 0;

        loop {
            pages_seen += 1;
            if pages_seen > MAX_PAGES_PER_CHAPTER {
                return Err(ApiError::PaginationError(format!(
                    "chapter {chapter_id} exceeded {MAX_PAGES_PER_CHAPTER} pages"
                )));
            }

            let response = self.get_verses_page(chapter_id, page, translations).await?;
            debug!(
                chapter = chapter_id,
                page,
                verses = response.verses.len(),
                "Fetched verse page"
            );
            verses.extend(response.verses);

            match response.pagination.and_then(|p| p.next_page) {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(verses)
    }

    /// Fetch the tafsir text for one verse.
    ///
    /// Returns `Ok(None)` when the commentary does not exist (HTTP 404 or
    /// an empty body); commentary gaps are expected, not errors.
    pub async fn get_tafsir_by_ayah(
        &self,
        tafsir_id: u32,
        verse_key: VerseKey,
    ) -> ApiResult<Option<String>> {
        let path = format!("tafsirs/{tafsir_id}/by_ayah/{verse_key}");
        match self.get_json::<TafsirResponse>(&path, &[]).await {
            Ok(response) => Ok(response
                .tafsir
                .and_then(|t| t.text)
                .filter(|text| !text.is_empty())),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List available translation resources.
    pub async fn get_translations_list(&self) -> ApiResult<Vec<ResourceInfo>> {
        let response: TranslationsResponse = self.get_json("resources/translations", &[]).await?;
        Ok(response
            .translations
            .into_iter()
            .map(ResourceInfo::from)
            .collect())
    }

    /// List available tafsir resources.
    pub async fn get_tafsirs_list(&self) -> ApiResult<Vec<ResourceInfo>> {
        let response: TafsirsResponse = self.get_json("resources/tafsirs", &[]).await?;
        Ok(response.tafsirs.into_iter().map(ResourceInfo::from).collect())
    }

    /// The request loop shared by every operation.
    ///
    /// Iterative on purpose: 429 handling loops back to the breaker gate
    /// rather than recursing, so an arbitrarily long throttling episode
    /// costs constant stack.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> ApiResult<T> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut transient_attempts: u32 = 0;
        let mut rate_limit_retries: u32 = 0;

        loop {
            // Gate: wait out an open breaker, polling so a concurrent
            // reset or cooldown expiry is noticed promptly.
            while !self.breaker.should_allow() {
                let remaining = self
                    .breaker
                    .remaining_cooldown()
                    .unwrap_or(BREAKER_POLL_MAX);
                sleep(remaining.min(BREAKER_POLL_MAX)).await;
            }

            self.rate_limiter.await_turn().await;

            let response = match self.http.get(&url).query(query).send().await {
                Ok(response) => response,
                Err(e) => {
                    if transient_attempts < self.config.max_retries {
                        transient_attempts += 1;
                        let backoff = RETRY_BACKOFF_BASE * 2u32.pow(transient_attempts - 1);
                        warn!(
                            url = %url,
                            attempt = transient_attempts,
                            error = %e,
                            "Network error, retrying"
                        );
                        sleep(backoff).await;
                        continue;
                    }
                    return Err(ApiError::NetworkError(e.to_string()));
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                rate_limit_retries += 1;
                if let Some(cap) = self.config.max_rate_limit_retries {
                    if rate_limit_retries > cap {
                        return Err(ApiError::RateLimited(cap));
                    }
                }

                let tripped = self.breaker.record_failure();
                if tripped {
                    self.breaker.reduce_concurrency();
                    sleep(self.breaker.cooldown()).await;
                } else {
                    let failures = self
                        .breaker
                        .consecutive_failures()
                        .min(RATE_LIMIT_BACKOFF_MAX_EXP);
                    sleep(Duration::from_secs(1u64 << failures)).await;
                }
                continue;
            }

            if status.is_success() {
                self.breaker.record_success();
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| ApiError::ParseError(format!("{url}: {e}")));
            }

            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(url));
            }

            let transient = matches!(status.as_u16(), 502 | 503 | 504);
            if transient && transient_attempts < self.config.max_retries {
                transient_attempts += 1;
                let backoff = RETRY_BACKOFF_BASE * 2u32.pow(transient_attempts - 1);
                warn!(
                    url = %url,
                    status = status.as_u16(),
                    attempt = transient_attempts,
                    "Server error, retrying"
                );
                sleep(backoff).await;
                continue;
            }

            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
    }
}
