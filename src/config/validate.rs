// src/config/validate.rs

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile, Settings};
use crate::engine::RuntimeOptions;
use crate::errors::{Result, UlosError};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::UlosError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_delays(cfg)?;
    validate_exclude_patterns(&cfg.watch.exclude)?;
    validate_function(cfg)?;
    Ok(())
}

fn validate_delays(cfg: &RawConfigFile) -> Result<()> {
    if cfg.delay.retry_ms == 0 {
        return Err(UlosError::ConfigError(
            "[delay].retry_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_exclude_patterns(patterns: &[String]) -> Result<()> {
    build_globset(patterns)
        .map_err(|err| UlosError::ConfigError(format!("[watch].exclude: {err:#}")))?;
    Ok(())
}

fn validate_function(cfg: &RawConfigFile) -> Result<()> {
    let checks = [
        ("name", &cfg.function.name),
        ("region", &cfg.function.region),
        ("profile", &cfg.function.profile),
    ];
    for (field, value) in checks {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(UlosError::ConfigError(format!(
                "[function].{field} must not be empty"
            )));
        }
    }
    Ok(())
}

impl Settings {
    /// Merge CLI flags over the config file and check that everything needed
    /// to deploy is present.
    pub fn resolve(cfg: ConfigFile, args: &CliArgs) -> Result<Self> {
        let function_name = required(
            args.lambda.clone().or(cfg.function.name),
            "no Lambda function given; pass --lambda <NAME> or set [function].name",
        )?;
        let region = required(
            args.region.clone().or(cfg.function.region),
            "no AWS region given; pass --region <REGION> or set [function].region",
        )?;
        let target = required(
            args.target.clone().or(cfg.watch.target),
            "no target given; pass --target <PATH> or set [watch].target",
        )?;

        if !target.exists() {
            return Err(UlosError::ConfigError(format!(
                "target {target:?} does not exist"
            )));
        }

        let mut exclude = cfg.watch.exclude;
        if !args.exclude.is_empty() {
            validate_exclude_patterns(&args.exclude)?;
            exclude.extend(args.exclude.iter().cloned());
        }

        Ok(Self {
            function_name,
            region,
            profile: args.profile.clone().or(cfg.function.profile),
            target,
            exclude,
            delays: cfg.delay.delays(),
            runtime: RuntimeOptions {
                retry_interval: cfg.delay.retry_interval(),
                keep_watching_on_error: args.keep_watching
                    || cfg.behaviour.keep_watching_on_error,
            },
        })
    }
}

fn required<T>(value: Option<T>, message: &str) -> Result<T> {
    value.ok_or_else(|| UlosError::ConfigError(message.to_string()))
}
