// src/presentation.rs

//! Status lines on stdout.

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::types::PipelineStatus;

/// Render one status line.
pub fn render_status(status: &PipelineStatus, now: DateTime<Local>) -> String {
    match status {
        PipelineStatus::Uploading => "[ulos] uploading deployment package".to_string(),
        PipelineStatus::Uploaded { code_size } => format!(
            "[ulos] deployment package uploaded ({code_size} bytes) [{}]",
            now.format("%H:%M:%S")
        ),
        PipelineStatus::Failed { message } => format!("[ulos] upload failed: {message}"),
    }
}

/// Print every status published by the pipeline until the channel closes.
pub fn spawn_status_printer(mut status_rx: mpsc::Receiver<PipelineStatus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            println!("{}", render_status(&status, Local::now()));
        }
        debug!("status printer finished");
    })
}
