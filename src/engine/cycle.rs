// src/engine/cycle.rs

//! One archive + upload pass.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::archive::Archiver;
use crate::engine::CycleOutcome;
use crate::engine::queue::PendingQueue;
use crate::errors::Result;
use crate::types::PipelineStatus;
use crate::upload::{FunctionCodeClient, UploadOutcome, Uploader};

/// Owns the archive and upload state.
///
/// Exactly one place holds the `UploadCycle` at any time: the queue manager
/// while idle, or the task running the current cycle. That hand-off is what
/// keeps cycles from overlapping.
pub struct UploadCycle<C: FunctionCodeClient> {
    archiver: Archiver,
    uploader: Uploader<C>,
    status_tx: mpsc::Sender<PipelineStatus>,
}

impl<C: FunctionCodeClient> fmt::Debug for UploadCycle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCycle")
            .field("archiver", &self.archiver)
            .field("uploader", &self.uploader)
            .finish_non_exhaustive()
    }
}

impl<C: FunctionCodeClient> UploadCycle<C> {
    pub fn new(
        archiver: Archiver,
        uploader: Uploader<C>,
        status_tx: mpsc::Sender<PipelineStatus>,
    ) -> Self {
        Self {
            archiver,
            uploader,
            status_tx,
        }
    }

    /// Archive `batch` and upload the result if it differs from what the
    /// endpoint last accepted.
    ///
    /// Entries are consumed from `batch` as they are applied.
    pub async fn run(&mut self, batch: &mut PendingQueue) -> Result<CycleOutcome> {
        let buffer = self.archiver.archive(batch).await?;

        if !self.uploader.has_changed(&buffer) {
            debug!("package matches the last accepted upload; nothing to send");
            return Ok(CycleOutcome::Unchanged);
        }

        self.publish(PipelineStatus::Uploading).await;

        let outcome = match self.uploader.upload(buffer).await? {
            UploadOutcome::Success { code_size } => CycleOutcome::Uploaded { code_size },
            UploadOutcome::Busy => CycleOutcome::Busy,
        };
        Ok(outcome)
    }

    async fn publish(&self, status: PipelineStatus) {
        if let Err(err) = self.status_tx.send(status).await {
            warn!("failed to publish status: {err}");
        }
    }
}
