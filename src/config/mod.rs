// src/config/mod.rs

//! Configuration loading and validation for ulos.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and merge CLI flags into [`Settings`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_config, load_from_path};
pub use model::{
    BehaviourSection, ConfigFile, DelaySection, FunctionSection, RawConfigFile, Settings,
    WatchSection,
};
