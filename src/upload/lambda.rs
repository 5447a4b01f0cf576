// src/upload/lambda.rs

use std::future::Future;
use std::pin::Pin;

use aws_config::SdkConfig;
use aws_sdk_lambda::Client;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::update_function_code::UpdateFunctionCodeError;
use aws_sdk_lambda::primitives::Blob;
use tracing::debug;

use crate::errors::{Result, UlosError};
use crate::upload::client::{FunctionCodeClient, RemoteResponse};

/// `UpdateFunctionCode` against one Lambda function.
#[derive(Debug, Clone)]
pub struct LambdaFunctionClient {
    client: Client,
    function_name: String,
}

impl LambdaFunctionClient {
    pub fn new(sdk_config: &SdkConfig, function_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(sdk_config),
            function_name: function_name.into(),
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }
}

impl FunctionCodeClient for LambdaFunctionClient {
    fn update_function_code(
        &self,
        package: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteResponse>> + Send + '_>> {
        Box::pin(async move {
            debug!(function = %self.function_name, bytes = package.len(), "UpdateFunctionCode");

            let result = self
                .client
                .update_function_code()
                .function_name(&self.function_name)
                .zip_file(Blob::new(package))
                .send()
                .await;

            let output = match result {
                Ok(output) => output,
                Err(err) => {
                    // A conflict means an update is already in progress on
                    // the function.
                    let conflict = err
                        .as_service_error()
                        .is_some_and(UpdateFunctionCodeError::is_resource_conflict_exception);
                    let status = err.raw_response().map(|r| r.status().as_u16());
                    if conflict && status == Some(409) {
                        return Ok(RemoteResponse::Conflict);
                    }
                    return Err(UlosError::UploadFailed(
                        DisplayErrorContext(&err).to_string(),
                    ));
                }
            };

            Ok(RemoteResponse::Accepted {
                code_sha256: output.code_sha256().unwrap_or_default().to_string(),
                code_size: u64::try_from(output.code_size()).unwrap_or(0),
            })
        })
    }
}
