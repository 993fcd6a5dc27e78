mod login;
mod parser;
mod quote;
mod scraper;
mod selectors;

pub use login::NavlungoAuthenticator;
pub use parser::normalize_quotes;
pub use quote::{build_quote_body, QuoteRequester, QuoteTransport, ReqwestTransport, TransportResponse};
pub use scraper::{is_quote_url, QuoteCollector, QuoteScraper};
pub use selectors::NavlungoSelectors;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::http::{ApiError, PriceRequest, QuoteResponse, SessionStatus};
use crate::providers::base::CarrierProvider;
use crate::session::{SystemClock, TokenManager, TokenStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub struct NavlungoProvider {
    browser: Arc<BrowserSession>,
    tokens: Arc<TokenManager>,
    requester: QuoteRequester,
    scraper: QuoteScraper,
    interactive_cancel: Mutex<CancellationToken>,
}

impl NavlungoProvider {
    /// Wires the browser, token manager, and both quote paths.
    pub fn new(config: Arc<Config>) -> Result<Self, ApiError> {
        let browser = Arc::new(BrowserSession::new(config.clone()));
        let authenticator = Arc::new(NavlungoAuthenticator::new(config.clone(), browser.clone()));
        let tokens = Arc::new(TokenManager::new(
            authenticator,
            TokenStore::new(config.token_file.clone()),
            Arc::new(SystemClock),
        ));
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);

        Ok(Self::from_parts(config, browser, tokens, transport))
    }

    pub fn from_parts(
        config: Arc<Config>,
        browser: Arc<BrowserSession>,
        tokens: Arc<TokenManager>,
        transport: Arc<dyn QuoteTransport>,
    ) -> Self {
        let requester = QuoteRequester::new(transport, tokens.clone(), &config.quote_api_url);
        let scraper = QuoteScraper::new(config, browser.clone(), tokens.clone());

        Self {
            browser,
            tokens,
            requester,
            scraper,
            interactive_cancel: Mutex::new(CancellationToken::new()),
        }
    }
}

#[async_trait]
impl CarrierProvider for NavlungoProvider {
    fn name(&self) -> &str {
        "Navlungo"
    }

    async fn fetch_prices(&self, request: PriceRequest) -> QuoteResponse {
        self.requester.get_prices(&request).await
    }

    async fn scrape_prices(&self, request: PriceRequest) -> QuoteResponse {
        self.scraper.scrape_prices(&request).await
    }

    async fn scrape_interactive(&self) -> QuoteResponse {
        let cancel = self
            .interactive_cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        self.scraper.scrape_interactive(cancel).await
    }

    async fn login(&self) -> Result<SessionStatus, ApiError> {
        self.tokens.refresh_access_token().await?;
        Ok(self.tokens.status())
    }

    fn session_status(&self) -> SessionStatus {
        self.tokens.status()
    }

    async fn invalidate_session(&self) {
        self.tokens.invalidate().await;
    }

    fn cancel_pending(&self) {
        self.tokens.cancel_login();

        let mut cancel = self
            .interactive_cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        cancel.cancel();
        *cancel = CancellationToken::new();
    }

    async fn shutdown(&self) {
        self.cancel_pending();
        self.browser.close().await;
    }
}
