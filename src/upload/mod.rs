// src/upload/mod.rs

//! Upload layer.
//!
//! - [`client`] defines the [`FunctionCodeClient`] seam and the endpoint's
//!   response shape.
//! - [`uploader`] owns the last accepted package hash and turns responses
//!   into success / busy outcomes.
//! - [`lambda`] is the production client backed by `aws-sdk-lambda`.
//! - [`credentials`] resolves region, profile and credentials.

pub mod client;
pub mod credentials;
pub mod lambda;
pub mod uploader;

pub use client::{FunctionCodeClient, RemoteResponse};
pub use credentials::load_sdk_config;
pub use lambda::LambdaFunctionClient;
pub use uploader::{UploadOutcome, Uploader};
