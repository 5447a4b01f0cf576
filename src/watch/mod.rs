// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Mapping filesystem paths to archive keys ([`path_utils::normalize`]).
//! - Compiling `exclude` glob patterns into a [`WatchFilter`].
//! - Wiring up a cross-platform filesystem watcher (`notify`) and turning its
//!   raw events into [`ChangeEvent`](crate::types::ChangeEvent)s.
//! - Priming: reporting every existing file once at startup.
//!
//! It does **not** know about archives or uploads; it only feeds the
//! pipeline.

pub mod events;
pub mod path_utils;
pub mod patterns;
pub mod scan;
pub mod watcher;

pub use path_utils::normalize;
pub use patterns::WatchFilter;
pub use scan::{WatchTarget, collect_files, prime};
pub use watcher::{WatcherHandle, changes_for_path, spawn_watcher, watch_and_prime};
