use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{DelayConfig, RuntimeOptions};

/// Configuration exactly as read from `Ulos.toml`, before validation.
///
/// ```toml
/// [function]
/// name = "my-function"
/// region = "eu-north-1"
/// profile = "dev"
///
/// [watch]
/// target = "dist"
/// exclude = ["**/*.map"]
///
/// [delay]
/// add_ms = 1000
/// change_ms = 0
/// unlink_ms = 1000
/// retry_ms = 2000
///
/// [behaviour]
/// keep_watching_on_error = false
/// ```
///
/// Every section is optional; most values can also come from the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub function: FunctionSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub delay: DelaySection,

    #[serde(default)]
    pub behaviour: BehaviourSection,
}

/// Validated configuration. Build it through `ConfigFile::try_from`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub function: FunctionSection,
    pub watch: WatchSection,
    pub delay: DelaySection,
    pub behaviour: BehaviourSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            function: raw.function,
            watch: raw.watch,
            delay: raw.delay,
            behaviour: raw.behaviour,
        }
    }
}

/// `[function]`: which Lambda function receives the package.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSection {
    /// Function name or ARN (`--lambda`).
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Named AWS profile; the default provider chain is used without one.
    #[serde(default)]
    pub profile: Option<String>,
}

/// `[watch]`: what gets packaged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Directory (watched recursively) or single file.
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// Glob patterns matched against archive keys, e.g. `"**/*.map"`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[delay]`: debounce and retry timing in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelaySection {
    #[serde(default = "default_add_ms")]
    pub add_ms: u64,

    #[serde(default = "default_change_ms")]
    pub change_ms: u64,

    #[serde(default = "default_unlink_ms")]
    pub unlink_ms: u64,

    /// Pause before retrying after a conflict or a mid-upload change.
    #[serde(default = "default_retry_ms")]
    pub retry_ms: u64,
}

fn default_add_ms() -> u64 {
    1000
}

fn default_change_ms() -> u64 {
    0
}

fn default_unlink_ms() -> u64 {
    1000
}

fn default_retry_ms() -> u64 {
    2000
}

impl Default for DelaySection {
    fn default() -> Self {
        Self {
            add_ms: default_add_ms(),
            change_ms: default_change_ms(),
            unlink_ms: default_unlink_ms(),
            retry_ms: default_retry_ms(),
        }
    }
}

impl DelaySection {
    pub fn delays(&self) -> DelayConfig {
        DelayConfig {
            add: Duration::from_millis(self.add_ms),
            change: Duration::from_millis(self.change_ms),
            unlink: Duration::from_millis(self.unlink_ms),
        }
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}

/// `[behaviour]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BehaviourSection {
    /// Publish fatal upload errors and keep watching instead of exiting.
    #[serde(default)]
    pub keep_watching_on_error: bool,
}

/// Everything the pipeline needs, after merging the config file with CLI
/// flags (flags win).
#[derive(Debug, Clone)]
pub struct Settings {
    pub function_name: String,
    pub region: String,
    pub profile: Option<String>,
    pub target: PathBuf,
    pub exclude: Vec<String>,
    pub delays: DelayConfig,
    pub runtime: RuntimeOptions,
}
