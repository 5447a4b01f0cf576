// src/archive/mod.rs

//! Incremental deployment package.
//!
//! The [`Archiver`] keeps every packaged file in memory together with a
//! content hash, applies batches of pending changes, and serializes the whole
//! package as a zip after each batch. The endpoint always receives the full
//! package, never a delta.

pub mod archiver;
pub mod hash;

pub use archiver::{Archiver, MAX_READ_ATTEMPTS};
pub use hash::{content_hash, package_hash};
