//! Throughput figure derived from a fetch's size and elapsed time.

use std::time::Duration;

/// Bytes per second for one fetch, or the reason it could not be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    /// `content_length / elapsed_secs`, unscaled.
    BytesPerSec(f64),
    /// Elapsed time was zero (below clock resolution); no finite figure exists.
    Unmeasurable,
    /// The server did not declare a content length.
    Unknown,
}

impl Bandwidth {
    pub fn compute(content_length: Option<u64>, elapsed: Duration) -> Self {
        let Some(len) = content_length else {
            return Bandwidth::Unknown;
        };
        let secs = elapsed.as_secs_f64();
        if secs == 0.0 {
            return Bandwidth::Unmeasurable;
        }
        Bandwidth::BytesPerSec(len as f64 / secs)
    }

    pub fn bytes_per_sec(&self) -> Option<f64> {
        match self {
            Bandwidth::BytesPerSec(v) => Some(*v),
            _ => None,
        }
    }
}
