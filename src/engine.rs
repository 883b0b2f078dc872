//! Job execution engine.
//!
//! Jobs run one after another. Within a job, addresses are either fetched
//! strictly in order (sequential) or each launched as its own task with the
//! job delay between launches (concurrent-paced). A paced job is only done
//! once every launched task has been joined. Fetch failures are reported and
//! never abort the job or its sibling fetches.
//!
//! There is no per-fetch timeout and no way to cancel a running job: a hung
//! request keeps its job open until the transport returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::fetch::Fetch;
use crate::job::{ExecMode, Job};
use crate::report::{FetchEvent, JobSummary, ReportSink};

/// Totals for a whole run over a job list.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    succeeded: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Drives jobs against one shared fetcher and reports into one sink.
#[derive(Clone)]
pub struct Engine {
    fetcher: Arc<dyn Fetch>,
    sink: Arc<dyn ReportSink>,
}

impl Engine {
    pub fn new(fetcher: Arc<dyn Fetch>, sink: Arc<dyn ReportSink>) -> Self {
        Self { fetcher, sink }
    }

    /// Run every job in order and return the per-job totals.
    pub async fn run_all(&self, jobs: &[Job]) -> RunSummary {
        let started_at = Local::now();
        let start = Instant::now();

        let mut summaries = Vec::with_capacity(jobs.len());
        for job in jobs {
            summaries.push(self.run_job(job).await);
        }

        RunSummary {
            started_at,
            finished_at: Local::now(),
            elapsed: start.elapsed(),
            jobs: summaries,
        }
    }

    /// Run one job to completion. Always returns a summary; individual
    /// failures show up in `failed`.
    pub async fn run_job(&self, job: &Job) -> JobSummary {
        let start = Instant::now();
        info!(job = job.id(), mode = %job.mode(), urls = job.urls().len(), "handling job");

        let tally = match job.mode() {
            ExecMode::Sequential => self.run_sequential(job).await,
            ExecMode::ConcurrentPaced => self.run_paced(job).await,
        };

        let summary = JobSummary {
            job_id: job.id().to_string(),
            elapsed: start.elapsed(),
            succeeded: tally.succeeded,
            failed: tally.failed,
        };
        info!(
            job = job.id(),
            elapsed = ?summary.elapsed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "job done"
        );
        self.sink.job_finished(&summary);
        summary
    }

    async fn run_sequential(&self, job: &Job) -> Tally {
        let mut tally = Tally::default();
        for addr in job.urls() {
            let ok = fetch_and_report(self.fetcher.as_ref(), self.sink.as_ref(), job.id(), addr).await;
            tally.record(ok);
        }
        tally
    }

    async fn run_paced(&self, job: &Job) -> Tally {
        let job_id: Arc<str> = Arc::from(job.id());
        let mut tasks = JoinSet::new();

        for (i, addr) in job.urls().iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(job.delay()).await;
            }
            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&self.sink);
            let job_id = Arc::clone(&job_id);
            let addr = addr.clone();
            tasks.spawn(async move {
                fetch_and_report(fetcher.as_ref(), sink.as_ref(), &job_id, &addr).await
            });
        }

        let mut tally = Tally::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(ok) => tally.record(ok),
                Err(e) => {
                    error!(job = %job_id, error = %e, "fetch task did not complete");
                    tally.record(false);
                }
            }
        }
        tally
    }
}

async fn fetch_and_report(fetcher: &dyn Fetch, sink: &dyn ReportSink, job_id: &str, addr: &str) -> bool {
    let outcome = fetcher.fetch(addr).await;
    if let Err(e) = &outcome {
        warn!(job = job_id, %addr, error = %e, "fetch failed");
    }
    sink.fetch_finished(&FetchEvent {
        job_id,
        addr,
        outcome: &outcome,
    });
    outcome.is_ok()
}
