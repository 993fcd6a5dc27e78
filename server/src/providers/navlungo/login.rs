use crate::browser::cdp::{fill_first, wait_for_network_idle};
use crate::browser::{capture_screenshot, evaluate_json, navigate, BrowserSession};
use crate::config::Config;
use crate::http::ApiError;
use crate::providers::navlungo::selectors::{
    indexed_db_token_script, local_storage_token_script, login_detected_script, NavlungoSelectors,
};
use crate::session::{
    parse_token_record, unless_cancelled, wait_for_login, AuthStage, Authenticator, CachedCredential,
    LoginProbe,
};
use crate::utils::mask_email;
use async_trait::async_trait;
use chromiumoxide::Page;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Human-assisted login against the carrier portal.
///
/// Credentials are typed in automatically; the operator solves the bot
/// challenge and submits. The token is then read from the page's storage.
pub struct NavlungoAuthenticator {
    config: Arc<Config>,
    browser: Arc<BrowserSession>,
    stage: watch::Sender<AuthStage>,
}

impl NavlungoAuthenticator {
    pub fn new(config: Arc<Config>, browser: Arc<BrowserSession>) -> Self {
        let (stage, _) = watch::channel(AuthStage::Idle);
        Self {
            config,
            browser,
            stage,
        }
    }

    fn set_stage(&self, stage: AuthStage) {
        tracing::debug!("Login stage: {:?}", stage);
        self.stage.send_replace(stage);
    }

    async fn run(&self, page: &Page, cancel: &CancellationToken) -> Result<CachedCredential, ApiError> {
        unless_cancelled(
            cancel,
            "navigation",
            navigate(page, &self.config.login_url, self.config.navigation_timeout()),
        )
        .await??;
        unless_cancelled(cancel, "page load", wait_for_network_idle(page, 5)).await?;

        tracing::info!("👤 Filling login form for {}", mask_email(&self.config.email));
        fill_first(page, NavlungoSelectors::EMAIL_INPUTS, &self.config.email)
            .await
            .ok_or_else(|| ApiError::LoginFailed("email input not found".to_string()))?;
        fill_first(page, NavlungoSelectors::PASSWORD_INPUTS, &self.config.password)
            .await
            .ok_or_else(|| ApiError::LoginFailed("password input not found".to_string()))?;
        self.set_stage(AuthStage::FormFilled);

        tracing::info!(
            "⏳ Waiting up to {}s for the operator to solve the challenge and submit",
            self.config.login_timeout().as_secs()
        );
        self.set_stage(AuthStage::WaitingForHuman);
        let probe = PageLoginProbe {
            page,
            script: login_detected_script(&self.config.login_path()),
        };
        wait_for_login(&probe, self.config.login_timeout(), LOGIN_POLL_INTERVAL, cancel).await?;
        self.set_stage(AuthStage::LoginDetected);
        tracing::info!("✅ Login detected");

        // The SDK writes its storage shortly after the redirect.
        unless_cancelled(cancel, "settle", tokio::time::sleep(self.config.login_settle())).await?;
        capture_screenshot(page, self.config.screenshot_dir.as_deref(), "after_login").await;

        self.set_stage(AuthStage::TokenExtraction);
        extract_credential(page).await
    }
}

#[async_trait]
impl Authenticator for NavlungoAuthenticator {
    async fn authenticate(&self, cancel: CancellationToken) -> Result<CachedCredential, ApiError> {
        self.set_stage(AuthStage::Idle);
        let mut guard = StageGuard::new(&self.stage);

        let lease = match self.browser.lease().await {
            Ok(lease) => lease,
            Err(e) => {
                self.set_stage(AuthStage::Failure);
                guard.finish();
                return Err(e);
            }
        };
        self.set_stage(AuthStage::BrowserLaunched);

        let result = self.run(&lease, &cancel).await;

        match &result {
            Ok(_) => self.set_stage(AuthStage::Success),
            Err(e) => {
                tracing::error!("❌ Login failed: {}", e);
                capture_screenshot(&lease, self.config.screenshot_dir.as_deref(), "login_error").await;
                self.set_stage(AuthStage::Failure);
            }
        }

        lease.release().await;
        guard.finish();
        result
    }

    fn stage(&self) -> AuthStage {
        *self.stage.borrow()
    }
}

/// Marks the flow failed if `authenticate` is dropped before it finishes,
/// e.g. when the waiting HTTP request goes away.
struct StageGuard<'a> {
    stage: &'a watch::Sender<AuthStage>,
    finished: bool,
}

impl<'a> StageGuard<'a> {
    fn new(stage: &'a watch::Sender<AuthStage>) -> Self {
        Self {
            stage,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("⚠️ Login abandoned at {:?}", *self.stage.borrow());
            self.stage.send_replace(AuthStage::Failure);
        }
    }
}

struct PageLoginProbe<'a> {
    page: &'a Page,
    script: String,
}

#[async_trait]
impl LoginProbe for PageLoginProbe<'_> {
    async fn login_detected(&self) -> bool {
        // Evaluation fails mid-navigation; that just means "not yet".
        matches!(
            evaluate_json(self.page, &self.script).await,
            Ok(Some(serde_json::Value::Bool(true)))
        )
    }
}

/// localStorage first, then the SDK's IndexedDB store.
async fn extract_credential(page: &Page) -> Result<CachedCredential, ApiError> {
    let local = evaluate_json(page, &local_storage_token_script()).await?;
    if let Some(credential) = local.as_ref().and_then(parse_token_record) {
        tracing::info!("🔑 Token found in localStorage");
        return Ok(credential);
    }

    tracing::debug!("No token in localStorage, trying IndexedDB");
    let indexed = evaluate_json(page, &indexed_db_token_script()).await?;
    if let Some(credential) = indexed.as_ref().and_then(parse_token_record) {
        tracing::info!("🔑 Token found in IndexedDB");
        return Ok(credential);
    }

    Err(ApiError::TokenExtraction(
        "neither localStorage nor IndexedDB held an auth record".to_string(),
    ))
}
