// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `ulos`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "ulos",
    version,
    about = "Watch a directory and push it to an AWS Lambda function on every change.",
    long_about = None
)]
pub struct CliArgs {
    /// Name or ARN of the Lambda function to update.
    #[arg(long, value_name = "NAME")]
    pub lambda: Option<String>,

    /// Directory (watched recursively) or single file to deploy.
    #[arg(long, value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// AWS region of the function.
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Named AWS profile. Without it the default credential chain is used.
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Extra exclude glob, matched against archive keys. Repeatable.
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Ulos.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Package and upload the current state once, then exit.
    #[arg(long)]
    pub once: bool,

    /// Report fatal upload errors and keep watching instead of exiting.
    #[arg(long)]
    pub keep_watching: bool,

    /// Print the resolved settings and exit without touching AWS.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ULOS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
