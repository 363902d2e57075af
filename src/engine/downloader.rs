// Bounded fetch worker pool: N workers drain a shared queue of missing files.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::report::SyncReport;
use super::stats::SyncProgress;
use crate::source::traits::RemoteSource;
use crate::store::atomic::write_atomic;

/// One missing file: where to get it and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub key: String,
    pub url: String,
    pub dest: PathBuf,
}

#[derive(Debug)]
enum FetchOutcome {
    Fetched,
    Failed(String),
    Cancelled,
}

pub struct FetchPool {
    source: Arc<dyn RemoteSource>,
    concurrency: usize,
    max_retries: u32,
    retry_backoff: Duration,
    cancel: CancellationToken,
    progress: Arc<SyncProgress>,
}

impl FetchPool {
    pub fn new(
        source: Arc<dyn RemoteSource>,
        max_concurrency: u32,
        progress: Arc<SyncProgress>,
    ) -> Self {
        Self {
            source,
            concurrency: (max_concurrency as usize).max(1),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
            cancel: CancellationToken::new(),
            progress,
        }
    }

    pub fn with_retry(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stop issuing new fetches and abort in-flight ones.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fetch every job, at most `concurrency` at a time.
    ///
    /// Individual failures are recorded in the report; the batch always runs to
    /// completion or cancellation. Jobs must have disjoint destinations.
    pub async fn run(&self, jobs: Vec<FetchJob>) -> SyncReport {
        let mut report = SyncReport {
            attempted: jobs.len(),
            ..SyncReport::default()
        };
        if jobs.is_empty() {
            return report;
        }

        let workers = self.concurrency.min(jobs.len());
        self.progress.record_queued(jobs.len() as u64);
        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (tx, mut rx) = mpsc::unbounded_channel::<(FetchJob, FetchOutcome)>();

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let worker = Worker {
                id: worker_id,
                source: Arc::clone(&self.source),
                queue: Arc::clone(&queue),
                results: tx.clone(),
                cancel: self.cancel.clone(),
                progress: Arc::clone(&self.progress),
                max_retries: self.max_retries,
                retry_backoff: self.retry_backoff,
            };
            handles.push(tokio::spawn(worker.run()));
        }
        drop(tx);

        while let Some((job, outcome)) = rx.recv().await {
            match outcome {
                FetchOutcome::Fetched => {
                    self.progress.record_finished(true);
                    report.succeeded += 1;
                }
                FetchOutcome::Failed(error) => {
                    self.progress.record_finished(false);
                    report.record_failure(job.key, Some(job.dest), error);
                }
                FetchOutcome::Cancelled => {
                    self.progress.record_finished(false);
                    report.cancelled += 1;
                }
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("fetch worker panicked: {}", e);
            }
        }

        // A panicked worker may have left jobs behind.
        for job in queue.lock().drain(..) {
            report.record_failure(job.key, Some(job.dest), "fetch worker terminated");
        }

        debug!(
            "fetch pool done: attempted={} succeeded={} failed={} cancelled={}",
            report.attempted,
            report.succeeded,
            report.failed_count(),
            report.cancelled
        );
        report
    }
}

struct Worker {
    id: usize,
    source: Arc<dyn RemoteSource>,
    queue: Arc<Mutex<VecDeque<FetchJob>>>,
    results: mpsc::UnboundedSender<(FetchJob, FetchOutcome)>,
    cancel: CancellationToken,
    progress: Arc<SyncProgress>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Worker {
    async fn run(self) {
        loop {
            // Lock only to pop; never held across a fetch.
            let next = self.queue.lock().pop_front();
            let Some(job) = next else {
                break;
            };

            let outcome = if self.cancel.is_cancelled() {
                FetchOutcome::Cancelled
            } else {
                self.progress.increment_workers();
                let outcome = tokio::select! {
                    outcome = self.fetch_with_retry(&job) => outcome,
                    _ = self.cancel.cancelled() => {
                        debug!("worker {} aborted {}", self.id, job.key);
                        FetchOutcome::Cancelled
                    }
                };
                self.progress.decrement_workers();
                outcome
            };

            if self.results.send((job, outcome)).is_err() {
                break;
            }
        }
    }

    async fn fetch_with_retry(&self, job: &FetchJob) -> FetchOutcome {
        let mut attempt = 0u32;
        loop {
            match self.source.fetch(&job.url).await {
                Ok(data) => {
                    let len = data.len() as u64;
                    let dest = job.dest.clone();
                    let stored =
                        tokio::task::spawn_blocking(move || write_atomic(&dest, &data)).await;
                    // Filesystem errors are permanent; no retry.
                    return match stored {
                        Ok(Ok(())) => {
                            self.progress.record_downloaded(len);
                            debug!("fetched {} ({} bytes)", job.key, len);
                            FetchOutcome::Fetched
                        }
                        Ok(Err(e)) => {
                            warn!("{} could not be stored: {}", job.key, e);
                            FetchOutcome::Failed(e.to_string())
                        }
                        Err(e) => {
                            warn!("{} write task failed: {}", job.key, e);
                            FetchOutcome::Failed(format!("write task failed: {}", e))
                        }
                    };
                }
                Err(e) if attempt < self.max_retries => {
                    warn!("{} fetch failed (attempt {}): {:#}", job.key, attempt, e);
                    attempt += 1;
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    warn!(
                        "{} fetch failed after {} retries: {:#}",
                        job.key, self.max_retries, e
                    );
                    return FetchOutcome::Failed(format!("{} ({:#})", job.url, e));
                }
            }
        }
    }
}
