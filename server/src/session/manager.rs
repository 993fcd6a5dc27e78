use crate::http::{ApiError, SessionStatus};
use crate::session::credential::{CachedCredential, Clock};
use crate::session::store::TokenStore;
use crate::session::wait::AuthStage;
use crate::utils::token_preview;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Produces a fresh credential, usually by walking a human through a login.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, cancel: CancellationToken) -> Result<CachedCredential, ApiError>;

    /// Current position in the login flow.
    fn stage(&self) -> AuthStage {
        AuthStage::Idle
    }
}

/// Hands out a valid bearer token, logging in only when memory and the token
/// file have nothing usable.
///
/// The credential mutex is held across a login so concurrent callers wait for
/// the same login instead of opening a second browser flow.
pub struct TokenManager {
    authenticator: Arc<dyn Authenticator>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    current: Mutex<Option<CachedCredential>>,
    cancel: std::sync::Mutex<CancellationToken>,
}

impl TokenManager {
    pub fn new(authenticator: Arc<dyn Authenticator>, store: TokenStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            authenticator,
            store,
            clock,
            current: Mutex::new(None),
            cancel: std::sync::Mutex::new(CancellationToken::new()),
        }
    }

    pub async fn get_access_token(&self) -> Result<String, ApiError> {
        let mut current = self.current.lock().await;
        let now = self.clock.now_ms();

        if let Some(credential) = current.as_ref().filter(|c| c.is_usable(now)) {
            return Ok(credential.access_token.clone());
        }

        if let Some(stored) = self.store.load() {
            if stored.is_usable(now) {
                tracing::info!(
                    "🔑 Reusing stored token {}",
                    token_preview(&stored.access_token)
                );
                let token = stored.access_token.clone();
                *current = Some(stored);
                return Ok(token);
            }
            tracing::info!("Stored token expires too soon, logging in again");
        }

        let fresh = self.login().await?;
        let token = fresh.access_token.clone();
        *current = Some(fresh);
        Ok(token)
    }

    /// Forces a new login, ignoring both the in-memory credential and the
    /// token file.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let mut current = self.current.lock().await;
        *current = None;

        let fresh = self.login().await?;
        let token = fresh.access_token.clone();
        *current = Some(fresh);
        Ok(token)
    }

    /// Replaces a token the carrier rejected.
    ///
    /// Callers that were rejected with the same token queue on the credential
    /// mutex; the first one logs in and the rest pick up its credential.
    pub async fn renew_rejected(&self, rejected: &str) -> Result<String, ApiError> {
        let mut current = self.current.lock().await;
        let now = self.clock.now_ms();

        if let Some(credential) = current
            .as_ref()
            .filter(|c| c.access_token != rejected && c.is_usable(now))
        {
            tracing::debug!("Rejected token was already replaced");
            return Ok(credential.access_token.clone());
        }

        if current.take().is_some() {
            tracing::info!("🗑️ Rejected token invalidated");
        }

        let fresh = self.login().await?;
        let token = fresh.access_token.clone();
        *current = Some(fresh);
        Ok(token)
    }

    /// Drops the in-memory credential. The token file is left alone.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        if current.take().is_some() {
            tracing::info!("🗑️ Cached token invalidated");
        }
    }

    /// Aborts a login that is waiting on the operator.
    pub fn cancel_login(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        cancel.cancel();
        *cancel = CancellationToken::new();
    }

    pub fn status(&self) -> SessionStatus {
        let stage = self.authenticator.stage();

        // A held lock means a login is running; report the stage without waiting.
        let credential = match self.current.try_lock() {
            Ok(current) => current.clone(),
            Err(_) => None,
        };

        let now = self.clock.now_ms();
        match credential {
            Some(c) => SessionStatus {
                authenticated: c.is_usable(now),
                expires_at: c.expires_at_utc(),
                user_id: c.user_id,
                stage,
            },
            None => SessionStatus {
                authenticated: false,
                expires_at: None,
                user_id: None,
                stage,
            },
        }
    }

    async fn login(&self) -> Result<CachedCredential, ApiError> {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        tracing::info!("🔐 No usable token, starting interactive login");
        let fresh = self.authenticator.authenticate(cancel).await?;

        if let Err(e) = self.store.save(&fresh) {
            tracing::warn!("⚠️ Token could not be persisted: {}", e);
        }

        tracing::info!(
            "✅ Login complete, token {} valid until {:?}",
            token_preview(&fresh.access_token),
            fresh.expires_at_utc()
        );
        Ok(fresh)
    }
}
