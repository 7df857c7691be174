//! Fire-and-forget ingest trigger.
//!
//! Upload surfaces enqueue a job and return to their caller immediately; a
//! background worker drains the queue and runs the pipeline. Indexed
//! content becomes visible eventually, not synchronously with the upload.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use super::DocumentPipeline;

/// One queued processing request.
#[derive(Debug)]
pub struct IngestJob {
    pub id: Uuid,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("ingest worker is no longer running")]
    WorkerStopped,
}

/// Producer handle for the ingest worker.
///
/// Cloneable; dropping every handle closes the queue, letting the worker
/// drain remaining jobs and exit.
#[derive(Clone)]
pub struct IngestQueue {
    sender: mpsc::UnboundedSender<IngestJob>,
}

impl IngestQueue {
    /// Spawns the worker task and returns the queue handle plus the worker's
    /// join handle. Await the join handle after dropping the queue to flush
    /// outstanding jobs.
    pub fn start(pipeline: Arc<DocumentPipeline>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(pipeline, receiver));
        (Self { sender }, handle)
    }

    /// Enqueues a document and returns its job id without waiting for
    /// processing.
    pub fn enqueue(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Uuid, QueueError> {
        let job = IngestJob {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            bytes,
        };
        let id = job.id;
        self.sender.send(job).map_err(|_| QueueError::WorkerStopped)?;
        Ok(id)
    }
}

/// A failing job is logged and dropped; the worker keeps draining.
async fn run_worker(pipeline: Arc<DocumentPipeline>, mut receiver: mpsc::UnboundedReceiver<IngestJob>) {
    while let Some(job) = receiver.recv().await {
        debug!(job = %job.id, file = %job.file_name, "ingest job started");
        if let Err(err) = pipeline.process(&job.file_name, &job.bytes).await {
            error!(job = %job.id, file = %job.file_name, error = %err, "ingest job failed");
        }
    }
}
