use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, oneshot};
use tokio::time::Instant;
use ulos::archive::package_hash;
use ulos::errors::{Result, UlosError};
use ulos::upload::{FunctionCodeClient, RemoteResponse};

/// What the fake endpoint answers to one upload.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Accept, reporting the package's own hash.
    Accept,
    /// Report an update already in progress.
    Conflict,
    /// Fail with `UlosError::UploadFailed`.
    Fail(String),
}

/// One call to `update_function_code`.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub package: Vec<u8>,
    pub at: Instant,
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<ScriptedResponse>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    code_size: Mutex<Option<u64>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    started: Notify,
}

/// A fake endpoint that:
/// - records every package it is sent, with the (possibly paused) time
/// - answers from a script, accepting once the script runs out
/// - can hold the first upload in flight until the test releases it.
///
/// Clones share state, so a test keeps one clone and hands the other to the
/// pipeline.
#[derive(Clone, Default)]
pub struct FakeFunctionClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FakeFunctionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeFunctionClient")
            .field("uploads", &self.upload_count())
            .finish_non_exhaustive()
    }
}

impl FakeFunctionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses, answered in order.
    pub fn with_script(self, responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        self.inner.script.lock().unwrap().extend(responses);
        self
    }

    /// Report this code size on accept instead of the package length.
    pub fn with_code_size(self, size: u64) -> Self {
        *self.inner.code_size.lock().unwrap() = Some(size);
        self
    }

    /// Hold the first upload until the returned sender fires (or drops).
    pub fn hold_first_upload(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.inner.gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Wait until an upload has reached the endpoint.
    pub async fn upload_started(&self) {
        self.inner.started.notified().await;
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.inner.uploads.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.inner.uploads.lock().unwrap().len()
    }
}

impl FunctionCodeClient for FakeFunctionClient {
    fn update_function_code(
        &self,
        package: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteResponse>> + Send + '_>> {
        Box::pin(async move {
            self.inner.uploads.lock().unwrap().push(RecordedUpload {
                package: package.clone(),
                at: Instant::now(),
            });
            self.inner.started.notify_one();

            let gate = self.inner.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            let response = self
                .inner
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ScriptedResponse::Accept);

            match response {
                ScriptedResponse::Accept => {
                    let size = self.inner.code_size.lock().unwrap().unwrap_or(package.len() as u64);
                    Ok(RemoteResponse::Accepted {
                        code_sha256: package_hash(&package),
                        code_size: size,
                    })
                }
                ScriptedResponse::Conflict => Ok(RemoteResponse::Conflict),
                ScriptedResponse::Fail(message) => Err(UlosError::UploadFailed(message)),
            }
        })
    }
}
