use crate::http::ApiError;
use crate::session::credential::CachedCredential;
use std::path::{Path, PathBuf};

/// JSON token file, read and written wholesale.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<CachedCredential> {
        if !self.path.exists() {
            tracing::debug!("Token file not found: {:?}", self.path);
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("⚠️ Token file unreadable {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str::<CachedCredential>(&content) {
            Ok(credential) => {
                tracing::debug!("Token file loaded: {:?}", self.path);
                Some(credential)
            }
            Err(e) => {
                tracing::warn!("⚠️ Token file is not a credential {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn save(&self, credential: &CachedCredential) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, content)?;

        tracing::info!("💾 Token saved: {:?}", self.path);
        Ok(())
    }
}
