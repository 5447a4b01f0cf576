#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use ulos::archive::Archiver;
use ulos::config::{ConfigFile, RawConfigFile};
use ulos::engine::{
    DelayConfig, PipelineEvent, QueueCore, QueueManager, RuntimeOptions, UploadCycle,
};
use ulos::fs::FileSystem;
use ulos::types::PipelineStatus;
use ulos::upload::Uploader;

use crate::fake_client::FakeFunctionClient;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn function(mut self, name: &str, region: &str) -> Self {
        self.config.function.name = Some(name.to_string());
        self.config.function.region = Some(region.to_string());
        self
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.config.function.profile = Some(profile.to_string());
        self
    }

    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.config.watch.target = Some(target.into());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn retry_ms(mut self, ms: u64) -> Self {
        self.config.delay.retry_ms = ms;
        self
    }

    pub fn keep_watching_on_error(mut self, val: bool) -> Self {
        self.config.behaviour.keep_watching_on_error = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A queue manager wired to a fake endpoint, plus the ends a test drives.
pub struct PipelineHarness {
    pub events: mpsc::Sender<PipelineEvent>,
    pub statuses: mpsc::Receiver<PipelineStatus>,
    pub manager: QueueManager<FakeFunctionClient>,
}

/// Builder for a [`PipelineHarness`].
pub struct PipelineBuilder {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    client: FakeFunctionClient,
    delays: DelayConfig,
    options: RuntimeOptions,
}

impl PipelineBuilder {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            client: FakeFunctionClient::new(),
            delays: DelayConfig::default(),
            options: RuntimeOptions::default(),
        }
    }

    pub fn client(mut self, client: FakeFunctionClient) -> Self {
        self.client = client;
        self
    }

    pub fn delays(mut self, delays: DelayConfig) -> Self {
        self.delays = delays;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.options.retry_interval = interval;
        self
    }

    pub fn keep_watching_on_error(mut self, val: bool) -> Self {
        self.options.keep_watching_on_error = val;
        self
    }

    pub fn build(self) -> PipelineHarness {
        let (events, event_rx) = mpsc::channel(64);
        let (status_tx, statuses) = mpsc::channel(64);

        let archiver = Archiver::new(self.root, self.fs);
        let cycle = UploadCycle::new(archiver, Uploader::new(self.client), status_tx.clone());
        let core = QueueCore::new(self.delays, self.options);
        let manager = QueueManager::new(core, event_rx, cycle, status_tx, self.options);

        PipelineHarness {
            events,
            statuses,
            manager,
        }
    }
}
