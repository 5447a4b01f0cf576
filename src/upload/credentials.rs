// src/upload/credentials.rs

//! AWS configuration and credential resolution.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_lambda::config::Region;
use tracing::{debug, info};

use crate::errors::{Result, UlosError};

/// Load the SDK configuration for `region` through the default provider
/// chain, optionally pinned to a named profile.
///
/// Credentials are resolved eagerly so a broken setup is reported before
/// anything is watched.
pub async fn load_sdk_config(region: &str, profile: Option<&str>) -> Result<SdkConfig> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    let sdk_config = loader.load().await;

    let provider = sdk_config.credentials_provider().ok_or_else(|| {
        UlosError::CredentialsError(missing_credentials_message(
            "no credentials provider configured",
            profile,
        ))
    })?;

    match provider.provide_credentials().await {
        Ok(credentials) => {
            debug!(expiry = ?credentials.expiry(), "resolved AWS credentials");
            info!(region, profile = profile.unwrap_or("default chain"), "AWS configuration loaded");
            Ok(sdk_config)
        }
        Err(err) => Err(UlosError::CredentialsError(missing_credentials_message(
            &err.to_string(),
            profile,
        ))),
    }
}

/// Without an explicit profile, point the user at `--profile`.
fn missing_credentials_message(reason: &str, profile: Option<&str>) -> String {
    match profile {
        Some(_) => reason.to_string(),
        None => format!("{reason}\n  You can specify a profile using the --profile flag"),
    }
}
