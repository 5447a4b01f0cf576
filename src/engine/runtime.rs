// src/engine/runtime.rs

use std::fmt;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Sleep;
use tracing::{debug, error, info, warn};

use crate::engine::core::QueueCore;
use crate::engine::cycle::UploadCycle;
use crate::engine::event_handlers::{CoreCommand, CoreInput, CoreStep};
use crate::engine::queue::PendingQueue;
use crate::engine::{CycleOutcome, PipelineEvent, RuntimeOptions};
use crate::errors::{Result, UlosError};
use crate::types::PipelineStatus;
use crate::upload::FunctionCodeClient;

type CycleResult<C> = (UploadCycle<C>, PendingQueue, Result<CycleOutcome>);

/// The pipeline's single owner of queue and debounce state.
///
/// This is the IO shell around [`QueueCore`]: it reads
/// [`PipelineEvent`]s, feeds them to the core, and carries out the
/// commands the core returns. It holds the one pending timer and the one
/// in-flight cycle; the core decides when either starts.
///
/// The loop ends on [`PipelineEvent::ShutdownRequested`], or once the event
/// channel is closed and the pipeline has gone idle.
pub struct QueueManager<C: FunctionCodeClient + 'static> {
    core: QueueCore,
    event_rx: mpsc::Receiver<PipelineEvent>,
    status_tx: mpsc::Sender<PipelineStatus>,
    options: RuntimeOptions,
    /// Present while no cycle is running.
    idle_cycle: Option<UploadCycle<C>>,
    in_flight: Option<JoinHandle<CycleResult<C>>>,
    timer: Option<Pin<Box<Sleep>>>,
    input_closed: bool,
}

impl<C: FunctionCodeClient + 'static> fmt::Debug for QueueManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueManager")
            .field("core", &self.core)
            .field("in_flight", &self.in_flight.is_some())
            .field("timer", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: FunctionCodeClient + 'static> QueueManager<C> {
    pub fn new(
        core: QueueCore,
        event_rx: mpsc::Receiver<PipelineEvent>,
        cycle: UploadCycle<C>,
        status_tx: mpsc::Sender<PipelineStatus>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            core,
            event_rx,
            status_tx,
            options,
            idle_cycle: Some(cycle),
            in_flight: None,
            timer: None,
            input_closed: false,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `PipelineEvent`s from `event_rx`.
    /// - Fires the pending timer and collects the in-flight cycle.
    /// - Executes commands returned by the core.
    pub async fn run(mut self) -> Result<()> {
        info!("ulos pipeline started");

        loop {
            if self.input_closed && self.is_settled() {
                info!("event channel closed and pipeline idle; exiting");
                break;
            }

            // Input first: changes already queued must reach the core before
            // a timer that is also ready can start a cycle.
            let step = tokio::select! {
                biased;

                maybe = self.event_rx.recv(), if !self.input_closed => match maybe {
                    Some(PipelineEvent::FileChanged(change)) => {
                        debug!(key = %change.key, kind = %change.kind, "pipeline received change");
                        self.core.step(CoreInput::Changed(change))
                    }
                    Some(PipelineEvent::ShutdownRequested) => {
                        info!("shutdown requested; stopping pipeline");
                        break;
                    }
                    None => {
                        debug!("pipeline event channel closed");
                        self.input_closed = true;
                        continue;
                    }
                },
                () = wait_timer(&mut self.timer), if self.timer.is_some() => {
                    self.timer = None;
                    self.core.step(CoreInput::TimerElapsed)
                }
                joined = wait_cycle(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.finish_cycle(joined).await?
                }
                else => {
                    warn!(core = ?self.core, "nothing left to wait on; stopping pipeline");
                    break;
                }
            };

            for command in step.commands {
                self.execute_command(command).await?;
            }
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }

        info!("pipeline exiting");
        Ok(())
    }

    /// True when no change is queued, no timer is pending and no cycle runs.
    fn is_settled(&self) -> bool {
        self.core.is_idle() && self.timer.is_none() && self.in_flight.is_none()
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::ScheduleTimer(delay) => {
                // Replacing the boxed sleep drops, and so cancels, the old one.
                self.timer = Some(Box::pin(tokio::time::sleep(delay)));
            }
            CoreCommand::StartCycle(batch) => {
                self.start_cycle(batch)?;
            }
            CoreCommand::Publish(status) => {
                self.publish(status).await;
            }
        }
        Ok(())
    }

    fn start_cycle(&mut self, mut batch: PendingQueue) -> Result<()> {
        let mut cycle = self.idle_cycle.take().ok_or_else(|| {
            UlosError::Other(anyhow!("cycle requested while another is in flight"))
        })?;

        debug!(changes = batch.len(), "starting upload cycle");

        self.in_flight = Some(tokio::spawn(async move {
            let result = cycle.run(&mut batch).await;
            (cycle, batch, result)
        }));
        Ok(())
    }

    /// Take back the cycle state and tell the core how the cycle ended.
    ///
    /// Fatal errors end the loop unless the pipeline keeps watching after
    /// errors, in which case they are published instead.
    async fn finish_cycle(
        &mut self,
        joined: std::result::Result<CycleResult<C>, JoinError>,
    ) -> Result<CoreStep> {
        let (cycle, leftover, result) =
            joined.map_err(|err| UlosError::Other(anyhow!("upload cycle task failed: {err}")))?;
        self.idle_cycle = Some(cycle);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) if self.options.keep_watching_on_error => {
                error!(error = %err, "upload cycle failed; still watching");
                self.publish(PipelineStatus::Failed {
                    message: err.to_string(),
                })
                .await;
                CycleOutcome::Failed
            }
            Err(err) => {
                error!(error = %err, "upload cycle failed");
                return Err(err);
            }
        };

        debug!(?outcome, pending = self.core.pending().len(), "upload cycle finished");
        Ok(self.core.step(CoreInput::CycleFinished { outcome, leftover }))
    }

    async fn publish(&self, status: PipelineStatus) {
        if let Err(err) = self.status_tx.send(status).await {
            warn!("failed to publish status: {err}");
        }
    }
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_cycle<C: FunctionCodeClient + 'static>(
    task: &mut Option<JoinHandle<CycleResult<C>>>,
) -> std::result::Result<CycleResult<C>, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
