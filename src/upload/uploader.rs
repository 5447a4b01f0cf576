// src/upload/uploader.rs

use std::fmt;

use tracing::{debug, info};

use crate::archive::hash::package_hash;
use crate::errors::Result;
use crate::upload::client::{FunctionCodeClient, RemoteResponse};

/// Result of one upload attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { code_size: u64 },
    Busy,
}

/// Pushes packages to the endpoint and remembers what it last accepted.
pub struct Uploader<C: FunctionCodeClient> {
    client: C,
    /// Endpoint-reported hash of the last accepted package; empty until the
    /// first success.
    last_accepted: String,
}

impl<C: FunctionCodeClient> fmt::Debug for Uploader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uploader")
            .field("last_accepted", &self.last_accepted)
            .finish_non_exhaustive()
    }
}

impl<C: FunctionCodeClient> Uploader<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            last_accepted: String::new(),
        }
    }

    /// Hash the endpoint reported for the last accepted package.
    pub fn last_accepted_hash(&self) -> &str {
        &self.last_accepted
    }

    /// True if `buffer` differs from the last package the endpoint accepted.
    pub fn has_changed(&self, buffer: &[u8]) -> bool {
        package_hash(buffer) != self.last_accepted
    }

    /// Send `buffer` to the endpoint.
    ///
    /// On success the endpoint's reported hash replaces the last accepted
    /// hash. Conflicts come back as [`UploadOutcome::Busy`]; every other
    /// failure is returned as an error.
    pub async fn upload(&mut self, buffer: Vec<u8>) -> Result<UploadOutcome> {
        let size = buffer.len();
        match self.client.update_function_code(buffer).await? {
            RemoteResponse::Accepted {
                code_sha256,
                code_size,
            } => {
                info!(sent = size, code_size, hash = %code_sha256, "package accepted");
                self.last_accepted = code_sha256;
                Ok(UploadOutcome::Success { code_size })
            }
            RemoteResponse::Conflict => {
                debug!(sent = size, "endpoint busy with another update");
                Ok(UploadOutcome::Busy)
            }
        }
    }
}
