// src/lib.rs

pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod presentation;
pub mod types;
pub mod upload;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::archive::Archiver;
use crate::cli::CliArgs;
use crate::config::{Settings, load_config};
use crate::engine::{PipelineEvent, QueueCore, QueueManager, UploadCycle};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{ChangeEvent, PipelineStatus};
use crate::upload::{LambdaFunctionClient, Uploader, load_sdk_config};
use crate::watch::{WatchFilter, WatchTarget, prime, watch_and_prime};

/// Capacity of the channel feeding the queue manager.
const PIPELINE_CHANNEL_CAPACITY: usize = 256;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI merge
/// - AWS credentials and the Lambda client
/// - archiver / uploader / queue manager
/// - file watcher (unless --once) and priming
/// - status output and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let settings = Settings::resolve(cfg, &args)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let target = WatchTarget::resolve(fs.as_ref(), &settings.target)?;
    let filter = WatchFilter::new(
        &settings.exclude,
        target.single_file().map(str::to_string),
    )?;

    let (pipeline_tx, pipeline_rx) = mpsc::channel::<PipelineEvent>(PIPELINE_CHANNEL_CAPACITY);

    // The watcher goes up before the scan, and before the credential lookup,
    // so files written meanwhile are queued by one or the other. In --once
    // mode nothing but priming sends events: the channel closes after the
    // last primed file and the manager exits once idle.
    let (_watcher_handle, primed) = if args.once {
        let primed = prime(fs.as_ref(), &target, &filter)?;
        if primed.is_empty() {
            info!(root = ?target.root(), "nothing to deploy");
            return Ok(());
        }
        (None, primed)
    } else {
        let (handle, primed) =
            watch_and_prime(fs.as_ref(), &target, &filter, pipeline_tx.clone())?;
        (Some(handle), primed)
    };

    let sdk_config = load_sdk_config(&settings.region, settings.profile.as_deref()).await?;
    let client = LambdaFunctionClient::new(&sdk_config, &settings.function_name);
    info!(function = %client.function_name(), root = ?target.root(), "deploying");

    let (status_tx, status_rx) = mpsc::channel::<PipelineStatus>(16);
    let printer = presentation::spawn_status_printer(status_rx);

    if !args.once {
        let tx = pipeline_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(PipelineEvent::ShutdownRequested).await;
        });
    }

    tokio::spawn(send_primed(primed, pipeline_tx));

    let archiver = Archiver::new(target.root(), Arc::clone(&fs));
    let cycle = UploadCycle::new(archiver, Uploader::new(client), status_tx.clone());
    let core = QueueCore::new(settings.delays, settings.runtime);
    let manager = QueueManager::new(core, pipeline_rx, cycle, status_tx, settings.runtime);

    let result = manager.run().await;

    // All status senders are gone once the manager is dropped; let the
    // printer flush what is left.
    if let Err(err) = printer.await {
        warn!("status printer failed: {err}");
    }

    result
}

async fn send_primed(primed: Vec<ChangeEvent>, tx: mpsc::Sender<PipelineEvent>) {
    let count = primed.len();
    for change in primed {
        if tx.send(PipelineEvent::FileChanged(change)).await.is_err() {
            debug!("pipeline closed while priming");
            return;
        }
    }
    debug!(count, "priming complete");
}

/// Print the resolved settings.
fn print_dry_run(settings: &Settings) {
    println!("ulos dry-run");
    println!("  function: {}", settings.function_name);
    println!("  region:   {}", settings.region);
    if let Some(profile) = &settings.profile {
        println!("  profile:  {profile}");
    }
    println!("  target:   {}", settings.target.display());
    if !settings.exclude.is_empty() {
        println!("  exclude:  {:?}", settings.exclude);
    }
    println!(
        "  delays:   add={:?} change={:?} unlink={:?} retry={:?}",
        settings.delays.add,
        settings.delays.change,
        settings.delays.unlink,
        settings.runtime.retry_interval
    );
    println!(
        "  keep_watching_on_error: {}",
        settings.runtime.keep_watching_on_error
    );

    debug!("dry-run complete (no upload)");
}
