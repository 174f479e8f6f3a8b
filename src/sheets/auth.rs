use anyhow::Result;
use async_trait::async_trait;
use google_cloud_auth::{
    credentials::CredentialsFile, project::Config as AuthConfig, token::DefaultTokenSourceProvider,
};
use google_cloud_token::{TokenSource as GoogleSource, TokenSourceProvider};
use std::{fs, path::Path, sync::Arc};
use tracing::info;

use super::SheetsError;
use crate::config::ConfigError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SCOPES: [&str; 1] = [SPREADSHEETS_SCOPE];

/// Supplies bearer tokens for Sheets API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, for local tooling and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads and parses a service-account key file.
pub fn load_credentials(path: impl AsRef<Path>) -> Result<CredentialsFile, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::CredentialsIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::CredentialsFormat {
        path: path.to_path_buf(),
        source,
    })
}

/// Google OAuth tokens scoped to Sheets. Signing, exchange and refresh
/// are handled by `google-cloud-auth`; this only adapts its header value.
pub struct GoogleTokenSource {
    inner: Arc<dyn GoogleSource>,
}

impl GoogleTokenSource {
    pub fn new(inner: Arc<dyn GoogleSource>) -> Self {
        Self { inner }
    }

    pub async fn from_credentials(credentials: CredentialsFile) -> Result<Self, SheetsError> {
        let client = credentials.client_email.clone().unwrap_or_default();
        let config = AuthConfig::default().with_scopes(&SCOPES);
        let provider = DefaultTokenSourceProvider::new_with_credentials(config, Box::new(credentials))
            .await
            .map_err(|e| SheetsError::Auth(e.to_string()))?;
        info!(%client, "service account authorised");
        Ok(Self::new(provider.token_source()))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let credentials = load_credentials(path)?;
        Ok(Self::from_credentials(credentials).await?)
    }
}

#[async_trait]
impl TokenSource for GoogleTokenSource {
    async fn access_token(&self) -> Result<String> {
        let header = self
            .inner
            .token()
            .await
            .map_err(|e| SheetsError::Auth(e.to_string()))?;
        Ok(strip_bearer(&header).to_string())
    }
}

/// The provider hands back a full `Authorization` value.
fn strip_bearer(header: &str) -> &str {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim()
}
