//! Fetch-and-discard primitive: one GET, body drained, timing and size recorded.

pub mod http;

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::bandwidth::Bandwidth;

pub use self::http::HttpFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, TLS, bad URL).
    #[error("request to {addr} failed: {source}")]
    Request {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    /// Headers arrived but the body could not be read to the end.
    #[error("reading body from {addr} failed after {bytes_read} bytes: {source}")]
    Body {
        addr: String,
        bytes_read: u64,
        #[source]
        source: reqwest::Error,
    },
}

/// Metrics for a single completed fetch.
///
/// The elapsed time is always `end - start`; it is never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchResult {
    start: Instant,
    end: Instant,
    /// Length declared by the server, `None` when it sent no Content-Length.
    pub content_length: Option<u64>,
    /// Body bytes actually received.
    pub bytes_read: u64,
    pub status: u16,
}

impl FetchResult {
    /// Build a result bracketed by `start` and `end`. An `end` earlier than
    /// `start` is clamped to `start`.
    pub fn new(
        start: Instant,
        end: Instant,
        content_length: Option<u64>,
        bytes_read: u64,
        status: u16,
    ) -> Self {
        Self {
            start,
            end: end.max(start),
            content_length,
            bytes_read,
            status,
        }
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn elapsed(&self) -> Duration {
        self.end.duration_since(self.start)
    }

    /// Throughput in bytes per second over the declared content length.
    pub fn bandwidth(&self) -> Bandwidth {
        Bandwidth::compute(self.content_length, self.elapsed())
    }
}

/// Anything that can fetch an address and report its metrics.
///
/// Implementations are shared across concurrently running tasks and must not
/// mutate shared state.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, addr: &str) -> Result<FetchResult, FetchError>;
}
