//! Reporting sink: per-fetch and per-job events, console and JSON renderings.

use std::time::Duration;

use serde::Serialize;

use crate::bandwidth::Bandwidth;
use crate::fetch::{FetchError, FetchResult};

/// Outcome of one fetch within a job.
#[derive(Debug)]
pub struct FetchEvent<'a> {
    pub job_id: &'a str,
    pub addr: &'a str,
    pub outcome: &'a Result<FetchResult, FetchError>,
}

/// Totals for one completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
}

/// Receives events as the engine produces them. Called concurrently from
/// fetch tasks in paced mode.
pub trait ReportSink: Send + Sync {
    fn fetch_finished(&self, event: &FetchEvent<'_>);
    fn job_finished(&self, summary: &JobSummary);
}

/// Format a bandwidth with a decimal (1000-based) unit.
pub fn format_bandwidth(bw: Bandwidth) -> String {
    match bw {
        Bandwidth::Unmeasurable => "unmeasurable".to_string(),
        Bandwidth::Unknown => "unknown".to_string(),
        Bandwidth::BytesPerSec(b) if b >= 1e9 => format!("{:.2} GB/s", b / 1e9),
        Bandwidth::BytesPerSec(b) if b >= 1e6 => format!("{:.2} MB/s", b / 1e6),
        Bandwidth::BytesPerSec(b) if b >= 1e3 => format!("{:.2} KB/s", b / 1e3),
        Bandwidth::BytesPerSec(b) => format!("{:.2} B/s", b),
    }
}

pub fn format_elapsed(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

/// One human-readable line for a fetch outcome.
pub fn format_fetch_line(event: &FetchEvent<'_>) -> String {
    match event.outcome {
        Ok(res) => format!(
            "[{}] Downloaded: {} (status: {}, elapsed: {}, bandwidth: {})",
            event.job_id,
            event.addr,
            res.status,
            format_elapsed(res.elapsed()),
            format_bandwidth(res.bandwidth()),
        ),
        Err(e) => format!("[{}] error: {}", event.job_id, e),
    }
}

pub fn format_job_line(summary: &JobSummary) -> String {
    format!(
        "[{}] Done ({}, {} ok, {} failed)",
        summary.job_id,
        format_elapsed(summary.elapsed),
        summary.succeeded,
        summary.failed,
    )
}

/// Prints human-readable lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ReportSink for ConsoleReporter {
    fn fetch_finished(&self, event: &FetchEvent<'_>) {
        println!("{}", format_fetch_line(event));
    }

    fn job_finished(&self, summary: &JobSummary) {
        println!("{}", format_job_line(summary));
    }
}

#[derive(Serialize)]
struct FetchLine<'a> {
    event: &'static str,
    job_id: &'a str,
    addr: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes_read: Option<u64>,
    /// Absent when unknown or unmeasurable; see `bandwidth_note`.
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bandwidth_note: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> FetchLine<'a> {
    fn from_event(event: &FetchEvent<'a>) -> Self {
        let mut line = FetchLine {
            event: "fetch",
            job_id: event.job_id,
            addr: event.addr,
            status: None,
            elapsed_secs: None,
            content_length: None,
            bytes_read: None,
            bytes_per_sec: None,
            bandwidth_note: None,
            error: None,
        };
        match event.outcome {
            Ok(res) => {
                let bw = res.bandwidth();
                line.status = Some(res.status);
                line.elapsed_secs = Some(res.elapsed().as_secs_f64());
                line.content_length = res.content_length;
                line.bytes_read = Some(res.bytes_read);
                line.bytes_per_sec = bw.bytes_per_sec();
                line.bandwidth_note = match bw {
                    Bandwidth::BytesPerSec(_) => None,
                    Bandwidth::Unmeasurable => Some("unmeasurable"),
                    Bandwidth::Unknown => Some("unknown"),
                };
            }
            Err(e) => line.error = Some(e.to_string()),
        }
        line
    }
}

#[derive(Serialize)]
struct JobLine<'a> {
    event: &'static str,
    #[serde(flatten)]
    summary: &'a JobSummary,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

pub fn json_fetch_line(event: &FetchEvent<'_>) -> serde_json::Result<String> {
    serde_json::to_string(&FetchLine::from_event(event))
}

pub fn json_job_line(summary: &JobSummary) -> serde_json::Result<String> {
    serde_json::to_string(&JobLine {
        event: "job",
        summary,
    })
}

/// Prints one JSON object per line to stdout.
#[derive(Debug, Default)]
pub struct JsonReporter;

impl ReportSink for JsonReporter {
    fn fetch_finished(&self, event: &FetchEvent<'_>) {
        match json_fetch_line(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "failed to encode fetch event"),
        }
    }

    fn job_finished(&self, summary: &JobSummary) {
        match json_job_line(summary) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "failed to encode job summary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn ok_result(len: Option<u64>, elapsed: Duration) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        Ok(FetchResult::new(start, start + elapsed, len, len.unwrap_or(0), 200))
    }

    #[test]
    fn test_format_bandwidth_units() {
        assert_eq!(format_bandwidth(Bandwidth::BytesPerSec(100.0)), "100.00 B/s");
        assert_eq!(format_bandwidth(Bandwidth::BytesPerSec(2_410.0)), "2.41 KB/s");
        assert_eq!(format_bandwidth(Bandwidth::BytesPerSec(2_410_000.0)), "2.41 MB/s");
        assert_eq!(format_bandwidth(Bandwidth::BytesPerSec(9_412_000_000.0)), "9.41 GB/s");
        assert_eq!(format_bandwidth(Bandwidth::Unmeasurable), "unmeasurable");
        assert_eq!(format_bandwidth(Bandwidth::Unknown), "unknown");
    }

    #[test]
    fn test_format_fetch_line_ok() {
        let outcome = ok_result(Some(300), Duration::from_secs(3));
        let line = format_fetch_line(&FetchEvent {
            job_id: "cdn",
            addr: "http://example.test/a",
            outcome: &outcome,
        });
        assert!(line.starts_with("[cdn] Downloaded: http://example.test/a"));
        assert!(line.contains("elapsed: 3.000s"));
        assert!(line.contains("bandwidth: 100.00 B/s"));
    }

    #[test]
    fn test_format_job_line() {
        let summary = JobSummary {
            job_id: "cdn".to_string(),
            elapsed: Duration::from_millis(3004),
            succeeded: 2,
            failed: 1,
        };
        assert_eq!(format_job_line(&summary), "[cdn] Done (3.004s, 2 ok, 1 failed)");
    }

    #[test]
    fn test_json_fetch_line_unknown_length() {
        let outcome = ok_result(None, Duration::from_secs(1));
        let line = json_fetch_line(&FetchEvent {
            job_id: "j",
            addr: "http://x",
            outcome: &outcome,
        })
        .unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["event"], "fetch");
        assert_eq!(v["bandwidth_note"], "unknown");
        assert!(v.get("bytes_per_sec").is_none());
        assert!(v.get("content_length").is_none());
    }

    #[test]
    fn test_json_job_line() {
        let summary = JobSummary {
            job_id: "j".to_string(),
            elapsed: Duration::from_millis(1500),
            succeeded: 3,
            failed: 0,
        };
        let v: serde_json::Value = serde_json::from_str(&json_job_line(&summary).unwrap()).unwrap();
        assert_eq!(v["event"], "job");
        assert_eq!(v["job_id"], "j");
        assert_eq!(v["elapsed"], 1.5);
        assert_eq!(v["succeeded"], 3);
    }
}
