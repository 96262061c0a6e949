//! Fire-and-forget dispatch of pipeline jobs
//!
//! `submit` acknowledges immediately; the job runs later on a worker that
//! spawns one task per job. The acknowledgement and the record's status
//! updates are independent: the caller learns about progress only by
//! reading the store.

use super::{CaptureEvent, Pipeline};
use crate::record::Status;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

/// Work accepted by the dispatcher
#[derive(Debug, Clone)]
pub enum Job {
    Capture(CaptureEvent),
    /// Deferred article fetch for the record with this key
    FetchArticle(String),
}

impl Job {
    pub fn key(&self) -> &str {
        match self {
            Job::Capture(event) => &event.key,
            Job::FetchArticle(key) => key,
        }
    }
}

/// Immediate answer to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub accepted: bool,
    pub key: String,
}

/// Totals reported when the dispatcher shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs that reached `done`
    pub done: usize,
    /// Jobs that ended in `error` or could not run
    pub failed: usize,
}

/// Work queue feeding pipeline tasks
///
/// Must be created inside a Tokio runtime.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<DispatchReport>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(pipeline, rx));
        Self { tx, worker }
    }

    /// Queue a job and return at once.
    pub fn submit(&self, job: Job) -> Ack {
        let key = job.key().to_string();
        let accepted = self.tx.send(job).is_ok();
        if !accepted {
            warn!(%key, "dispatcher worker is gone; job dropped");
        }
        Ack { accepted, key }
    }

    /// Stop accepting work and wait for every queued job to finish.
    pub async fn shutdown(self) -> DispatchReport {
        drop(self.tx);
        match self.worker.await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "dispatcher worker panicked");
                DispatchReport::default()
            }
        }
    }
}

async fn run_job(pipeline: Arc<Pipeline>, job: Job) -> Option<Status> {
    let key = job.key().to_string();
    let result = match job {
        Job::Capture(event) => pipeline.capture(event).await,
        Job::FetchArticle(key) => pipeline.fetch_article_for(&key).await,
    };
    match result {
        Ok(status) => {
            debug!(%key, %status, "job finished");
            Some(status)
        }
        Err(e) => {
            warn!(%key, error = %e, "job failed");
            None
        }
    }
}

fn tally(outcome: Option<Status>, report: &mut DispatchReport) {
    match outcome {
        Some(Status::Done) => report.done += 1,
        _ => report.failed += 1,
    }
}

async fn run_worker(
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::UnboundedReceiver<Job>,
) -> DispatchReport {
    let mut tasks = JoinSet::new();
    let mut report = DispatchReport::default();

    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => {
                    tasks.spawn(run_job(pipeline.clone(), job));
                }
                None => break,
            },
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                tally(joined.ok().flatten(), &mut report);
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        tally(joined.ok().flatten(), &mut report);
    }
    report
}
