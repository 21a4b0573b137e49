use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Access/refresh token pair for the camera provider. The pair is the whole
/// authentication state: both tokens are always persisted together, and a
/// refresh or re-login replaces them wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl TokenPair {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Absent state yields an empty pair, which triggers a full re-login.
    async fn load(&self) -> Result<TokenPair>;
    /// Whole-pair overwrite-in-place. No versioning, no rollback.
    async fn store(&self, pair: &TokenPair) -> Result<()>;
}

pub const CREDENTIALS_PATH: &str = "wyze_credentials.json";

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<TokenPair> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
            Err(_) => Ok(TokenPair::default()),
        }
    }

    async fn store(&self, pair: &TokenPair) -> Result<()> {
        let json = serde_json::to_string_pretty(pair)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
