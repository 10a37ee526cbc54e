//! API access layer
//!
//! Wraps the remote content API behind a single request path:
//!
//! 1. **Circuit breaker gate** - blocks while the breaker is open
//! 2. **Rate limiter** - enforces a process-wide minimum request gap
//! 3. **Pooled HTTP transport** - bounded retry for transient server errors
//! 4. **429 absorption** - rate-limit responses feed the breaker and are
//!    retried in place, never surfaced to callers
//!
//! # Components
//!
//! - [`client`] - Typed API operations and pagination traversal
//! - [`rate_limit`] - Minimum inter-request delay, shared by all callers
//! - [`circuit_breaker`] - Throttling detector with concurrency reduction
//! - [`types`] - Wire DTOs for the JSON responses

pub mod circuit_breaker;
pub mod client;
pub mod rate_limit;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitSnapshot};
pub use client::{ApiClientConfig, QuranApiClient};
pub use rate_limit::RateLimiter;

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or timeout error from the transport
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status after transport retries were exhausted
    #[error("HTTP error {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Resource does not exist (HTTP 404), distinct from other errors so
    /// callers can treat missing auxiliary content as an absent value
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate-limit retries exhausted (only with a configured retry cap)
    #[error("rate limited: retry cap of {0} reached")]
    RateLimited(u32),

    /// Response body failed to decode
    #[error("parse error: {0}")]
    ParseError(String),

    /// Pagination failed to terminate within the page guard
    #[error("pagination error: {0}")]
    PaginationError(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
