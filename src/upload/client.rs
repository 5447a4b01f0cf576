// src/upload/client.rs

//! Pluggable deployment endpoint abstraction.
//!
//! The [`Uploader`](super::Uploader) talks to a `FunctionCodeClient` instead
//! of the AWS SDK directly. Production code uses
//! [`LambdaFunctionClient`](super::LambdaFunctionClient); tests provide a
//! scripted client that never touches the network.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

/// Answer from the endpoint to a code update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResponse {
    /// The new code was accepted. Hash and size are what the endpoint
    /// reports, which need not match the local buffer.
    Accepted { code_sha256: String, code_size: u64 },
    /// Another update is in progress (HTTP 409); not a failure.
    Conflict,
}

/// Trait abstracting how a package reaches the function.
///
/// Any error returned is fatal for the cycle: the implementation must map
/// conflicts to [`RemoteResponse::Conflict`] rather than an error.
pub trait FunctionCodeClient: Send + Sync {
    /// Replace the function's code with `package`.
    fn update_function_code(
        &self,
        package: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteResponse>> + Send + '_>>;
}
