//! speedjob -- job-driven HTTP bandwidth measurement.
//!
//! A job list names batches of URLs; each URL is fetched, its body drained and
//! discarded, and the elapsed time and throughput are reported.

pub mod bandwidth;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod job;
pub mod report;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::engine::{Engine, RunSummary};
use crate::fetch::HttpFetcher;
use crate::report::{ConsoleReporter, JsonReporter, ReportSink};

/// Load the job list at `job_path` and run every job with `config`.
pub async fn run(job_path: &Path, config: &Config) -> Result<RunSummary> {
    let text = !config.output.json;

    if text {
        println!("Parsing input file {}...", job_path.display());
    }
    let jobs = job::load_jobs(job_path)?;
    tracing::info!(path = %job_path.display(), count = jobs.len(), "job list loaded");

    let client = config::build_client(&config.transport)?;
    let fetcher = Arc::new(HttpFetcher::new(client));
    let sink: Arc<dyn ReportSink> = if text {
        Arc::new(ConsoleReporter)
    } else {
        Arc::new(JsonReporter)
    };
    let engine = Engine::new(fetcher, sink);

    if text {
        println!("Jobs count: {}", jobs.len());
        println!("Test is starting...\n");
        println!("Start time: {}", chrono::Local::now().to_rfc3339());
    }

    let summary = engine.run_all(&jobs).await;

    if text {
        println!(
            "\nEnd time: {}, elapsed: {}",
            summary.finished_at.to_rfc3339(),
            report::format_elapsed(summary.elapsed)
        );
    }
    Ok(summary)
}
