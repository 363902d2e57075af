// Live synchronization progress: bytes fetched and queue depth.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

struct ProgressSample {
    at: Instant,
    download_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub download_bps: u64,
    pub downloaded_bytes: u64,
    pub active_workers: u32,
    pub queued: u64,
    pub completed: u64,
    pub failed: u64,
}

pub struct SyncProgress {
    download_bytes_total: AtomicU64,
    active_workers: AtomicU32,
    queued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    last_sample: Mutex<ProgressSample>,
}

impl SyncProgress {
    pub fn new() -> Self {
        Self {
            download_bytes_total: AtomicU64::new(0),
            active_workers: AtomicU32::new(0),
            queued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_sample: Mutex::new(ProgressSample {
                at: Instant::now(),
                download_bytes: 0,
            }),
        }
    }

    pub fn record_queued(&self, jobs: u64) {
        self.queued.fetch_add(jobs, Ordering::Relaxed);
    }

    pub fn record_downloaded(&self, bytes: u64) {
        self.download_bytes_total.fetch_add(bytes, Ordering::Relaxed);
    }

    /// A queued job finished, successfully or not.
    pub fn record_finished(&self, success: bool) {
        // Saturating: a snapshot may race with a late decrement.
        let _ = self
            .queued
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |q| Some(q.saturating_sub(1)));
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_workers(&self) {
        self.active_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_workers(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let now = Instant::now();
        let current_download = self.download_bytes_total.load(Ordering::Relaxed);

        let download_bps = {
            let mut sample = self.last_sample.lock();
            let elapsed = now.duration_since(sample.at).as_secs_f64();
            let bps = if elapsed > 0.1 {
                ((current_download - sample.download_bytes) as f64 / elapsed) as u64
            } else {
                0
            };
            sample.at = now;
            sample.download_bytes = current_download;
            bps
        };

        ProgressSnapshot {
            download_bps,
            downloaded_bytes: current_download,
            active_workers: self.active_workers.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn total_downloaded(&self) -> u64 {
        self.download_bytes_total.load(Ordering::Relaxed)
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}
