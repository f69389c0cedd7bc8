//! Worker pool with a bounded work queue.
//!
//! [`Dispatcher`] runs a fixed number of worker tasks that pull prompts from
//! a bounded `tokio::sync::mpsc` channel and answer them through a shared
//! [`Pipeline`]. The queue is the backpressure point: when it is full,
//! [`Dispatcher::enqueue`] fails immediately with
//! [`HuginnError::QueueFull`] instead of waiting or dropping the prompt.
//!
//! # Panics
//!
//! [`Dispatcher::start`] spawns tasks and must be called within a tokio
//! runtime.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::pipeline::Pipeline;
use crate::telemetry;
use crate::types::Reply;
use crate::{HuginnError, Result};

/// Default number of worker tasks.
pub const DEFAULT_WORKERS: usize = 2;

/// Default number of prompts waiting for a worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

struct Job {
    prompt: String,
    respond_to: oneshot::Sender<Reply>,
}

/// A reply that will be produced once a worker picks up the prompt.
pub struct PendingReply {
    rx: oneshot::Receiver<Reply>,
}

impl PendingReply {
    /// Wait for the worker to answer.
    pub async fn wait(self) -> Result<Reply> {
        self.rx.await.map_err(|_| HuginnError::DispatcherClosed)
    }
}

/// Fixed-size worker pool in front of a [`Pipeline`]. See module docs.
pub struct Dispatcher {
    tx: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    capacity: usize,
}

impl Dispatcher {
    /// Spawn the workers.
    ///
    /// `workers` and `queue_capacity` are raised to at least 1.
    pub fn start(pipeline: Arc<Pipeline>, config: DispatchConfig) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..config.workers.max(1))
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&rx), Arc::clone(&pipeline))))
            .collect();

        Self {
            tx: Some(tx),
            workers,
            capacity,
        }
    }

    /// Queue a prompt without waiting for the reply.
    ///
    /// Fails fast with `QueueFull` when `queue_capacity` prompts are already
    /// waiting, and with `DispatcherClosed` after shutdown.
    pub fn enqueue(&self, prompt: impl Into<String>) -> Result<PendingReply> {
        let tx = self.tx.as_ref().ok_or(HuginnError::DispatcherClosed)?;
        let (respond_to, rx) = oneshot::channel();
        let job = Job {
            prompt: prompt.into(),
            respond_to,
        };

        tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => {
                metrics::counter!(telemetry::DISPATCH_REJECTED_TOTAL).increment(1);
                warn!(capacity = self.capacity, "work queue full, rejecting prompt");
                HuginnError::QueueFull {
                    capacity: self.capacity,
                }
            }
            TrySendError::Closed(_) => HuginnError::DispatcherClosed,
        })?;

        Ok(PendingReply { rx })
    }

    /// Queue a prompt and wait for its reply.
    pub async fn submit(&self, prompt: impl Into<String>) -> Result<Reply> {
        self.enqueue(prompt)?.wait().await
    }

    /// Number of worker tasks.
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stop accepting prompts, let the workers drain the queue, and wait
    /// for them to exit.
    pub async fn shutdown(mut self) {
        self.tx.take();
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                warn!(error = %e, "dispatch worker ended abnormally");
            }
        }
    }
}

async fn worker_loop(id: usize, rx: Arc<Mutex<mpsc::Receiver<Job>>>, pipeline: Arc<Pipeline>) {
    loop {
        // Only one idle worker waits on the channel at a time.
        let job = rx.lock().await.recv().await;
        let Some(job) = job else {
            debug!(worker = id, "dispatch worker stopping");
            break;
        };

        let reply = pipeline.respond(&job.prompt).await;
        if job.respond_to.send(reply).is_err() {
            debug!(worker = id, "caller went away before the reply was ready");
        }
    }
}
