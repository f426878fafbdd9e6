//! Off-thread filter evaluation with "latest generation wins" semantics.
//!
//! Each submission gets a generation number from a shared atomic counter. The
//! worker checks the counter between rows and abandons a computation as soon
//! as a newer generation exists, and a result is only handed out if it belongs
//! to the newest generation. Two generations are never merged.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::engine::evaluate;
use super::projection::Projection;
use super::spec::FilterSpec;
use crate::store::OutlineStore;

struct Job {
    generation: u64,
    spec: FilterSpec,
    today: NaiveDate,
    store: Arc<OutlineStore>,
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub generation: u64,
    pub projection: Projection,
}

pub struct BackgroundMatcher {
    latest: Arc<AtomicU64>,
    jobs: Option<Sender<Job>>,
    results: Receiver<MatchResult>,
    worker: Option<JoinHandle<()>>,
}

impl Default for BackgroundMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundMatcher {
    pub fn new() -> Self {
        let latest = Arc::new(AtomicU64::new(0));
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel();
        let worker_latest = Arc::clone(&latest);
        let worker = thread::spawn(move || run_worker(job_rx, result_tx, worker_latest));
        Self {
            latest,
            jobs: Some(job_tx),
            results: result_rx,
            worker: Some(worker),
        }
    }

    /// The generation a published result must carry.
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Queues an evaluation of `spec` against an immutable store snapshot,
    /// superseding anything still in flight. Returns its generation.
    pub fn submit(&self, spec: FilterSpec, today: NaiveDate, store: Arc<OutlineStore>) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let job = Job {
            generation,
            spec,
            today,
            store,
        };
        if let Some(jobs) = &self.jobs {
            if jobs.send(job).is_err() {
                debug!(generation, "filter worker is gone");
            }
        }
        generation
    }

    /// The newest finished result, if it is still current.
    pub fn try_latest(&self) -> Option<MatchResult> {
        let mut newest = None;
        while let Ok(result) = self.results.try_recv() {
            newest = Some(result);
        }
        newest.filter(|r| r.generation == self.latest_generation())
    }

    /// Blocks until the current generation's result arrives or `timeout`
    /// passes. Stale results received meanwhile are discarded.
    pub fn wait(&self, timeout: Duration) -> Option<MatchResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let result = self.results.recv_timeout(remaining).ok()?;
            if result.generation == self.latest_generation() {
                return Some(result);
            }
            trace!(generation = result.generation, "dropped stale filter result");
        }
    }
}

impl Drop for BackgroundMatcher {
    fn drop(&mut self) {
        // closing the channel ends the worker loop
        self.jobs.take();
        self.latest.fetch_add(1, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(jobs: Receiver<Job>, results: Sender<MatchResult>, latest: Arc<AtomicU64>) {
    while let Ok(mut job) = jobs.recv() {
        // skip straight to the newest queued job
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }
        let generation = job.generation;
        let superseded = || latest.load(Ordering::SeqCst) != generation;
        if superseded() {
            continue;
        }
        let mut cache = HashMap::new();
        let outcome = evaluate(
            &job.store,
            &job.spec,
            job.today,
            None,
            &mut cache,
            &superseded,
        );
        match outcome {
            Some((projection, _)) if !superseded() => {
                if results
                    .send(MatchResult {
                        generation,
                        projection,
                    })
                    .is_err()
                {
                    return;
                }
            }
            _ => debug!(generation, "filter computation superseded"),
        }
    }
}
