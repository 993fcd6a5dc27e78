use crate::browser::{capture_screenshot, navigate, BrowserSession, PageLease};
use crate::config::Config;
use crate::http::{ApiError, PriceQuote, PriceRequest, QuoteResponse};
use crate::providers::navlungo::parser::normalize_quotes;
use crate::providers::navlungo::selectors::NavlungoSelectors;
use crate::session::TokenManager;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFinished, EventResponseReceived, GetResponseBodyParams,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub fn is_quote_url(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    NavlungoSelectors::QUOTE_URL_KEYWORDS
        .iter()
        .any(|keyword| url.contains(keyword))
}

/// Quotes captured from the page's own responses, in arrival order.
#[derive(Clone, Default)]
pub struct QuoteCollector {
    quotes: Arc<Mutex<Vec<PriceQuote>>>,
}

impl QuoteCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one response body. Non-JSON bodies are ignored.
    pub fn ingest(&self, url: &str, body: &str) -> usize {
        let raw: serde_json::Value = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(_) => {
                tracing::debug!("Skipping non-JSON response: {}", url);
                return 0;
            }
        };

        let found = normalize_quotes(&raw).quotes;
        if !found.is_empty() {
            tracing::info!("🎯 {} quotes captured from {}", found.len(), url);
            self.quotes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .extend(found.iter().cloned());
        }
        found.len()
    }

    pub fn snapshot(&self) -> Vec<PriceQuote> {
        self.quotes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Fallback quote path: drive the carrier's calculator page and keep the JSON
/// it receives from its own backend.
pub struct QuoteScraper {
    config: Arc<Config>,
    browser: Arc<BrowserSession>,
    tokens: Arc<TokenManager>,
}

impl QuoteScraper {
    pub fn new(config: Arc<Config>, browser: Arc<BrowserSession>, tokens: Arc<TokenManager>) -> Self {
        Self {
            config,
            browser,
            tokens,
        }
    }

    pub async fn scrape_prices(&self, request: &PriceRequest) -> QuoteResponse {
        tracing::info!(
            "🕸️ Scraping calculator for {} -> {}",
            request.origin_country,
            request.destination_country
        );

        let settle = self.config.scrape_settle();
        let result = self.capture(tokio::time::sleep(settle)).await;

        into_response(result, "No quotes captured from the calculator page; manual interaction may be required")
    }

    /// Keeps the calculator open for an operator to fill in by hand.
    pub async fn scrape_interactive(&self, cancel: CancellationToken) -> QuoteResponse {
        let window = self.config.interactive_window();
        tracing::info!(
            "🧑 Calculator open for manual use for up to {}s",
            window.as_secs()
        );

        let result = self
            .capture(async move {
                tokio::select! {
                    _ = cancel.cancelled() => tracing::info!("Interactive scrape cancelled"),
                    _ = tokio::time::sleep(window) => tracing::info!("Interactive window elapsed"),
                }
            })
            .await;

        into_response(result, "No quotes captured during the interactive session")
    }

    async fn capture(&self, hold: impl Future<Output = ()>) -> Result<Vec<PriceQuote>, ApiError> {
        // Token first: a login needs the browser, and the lease below holds it.
        self.tokens.get_access_token().await?;

        let lease = self.browser.lease().await?;
        let result = self.capture_on(&lease, hold).await;

        if result.is_err() {
            capture_screenshot(&lease, self.config.screenshot_dir.as_deref(), "calculator_error").await;
        }
        lease.release().await;
        result
    }

    async fn capture_on(
        &self,
        lease: &PageLease,
        hold: impl Future<Output = ()>,
    ) -> Result<Vec<PriceQuote>, ApiError> {
        let collector = QuoteCollector::new();
        let listener = spawn_response_listener(lease, collector.clone()).await?;
        let screenshots = self.config.screenshot_dir.as_deref();

        capture_screenshot(lease, screenshots, "calculator_before").await;
        let navigated = navigate(lease, &self.config.calculator_url, self.config.navigation_timeout()).await;
        if navigated.is_ok() {
            hold.await;
            capture_screenshot(lease, screenshots, "calculator_after").await;
        }

        listener.abort();
        navigated?;

        Ok(collector.snapshot())
    }
}

fn into_response(result: Result<Vec<PriceQuote>, ApiError>, empty_message: &str) -> QuoteResponse {
    match result {
        Ok(quotes) if quotes.is_empty() => {
            tracing::warn!("⚠️ {}", empty_message);
            QuoteResponse::failure(empty_message)
        }
        Ok(quotes) => {
            tracing::info!("✅ {} quotes captured", quotes.len());
            QuoteResponse::ok(quotes)
        }
        Err(e) => {
            tracing::error!("❌ Scrape failed: {}", e);
            QuoteResponse::failure(e.to_string())
        }
    }
}

/// Watches responses whose URL looks quote-related and feeds their bodies to
/// `collector` once loading has finished.
async fn spawn_response_listener(page: &PageLease, collector: QuoteCollector) -> Result<JoinHandle<()>, ApiError> {
    let page = (**page).clone();
    let mut responses = page.event_listener::<EventResponseReceived>().await?;
    let mut finished = page.event_listener::<EventLoadingFinished>().await?;

    Ok(tokio::spawn(async move {
        let mut pending: HashMap<String, String> = HashMap::new();

        loop {
            tokio::select! {
                Some(event) = responses.next() => {
                    if is_quote_url(&event.response.url) {
                        tracing::debug!("Watching response {}", event.response.url);
                        pending.insert(event.request_id.inner().clone(), event.response.url.clone());
                    }
                }
                Some(event) = finished.next() => {
                    let Some(url) = pending.remove(event.request_id.inner()) else {
                        continue;
                    };
                    match page.execute(GetResponseBodyParams::new(event.request_id.clone())).await {
                        Ok(body) if !body.result.base64_encoded => {
                            collector.ingest(&url, &body.result.body);
                        }
                        Ok(_) => tracing::debug!("Skipping binary response: {}", url),
                        Err(e) => tracing::debug!("Response body unavailable for {}: {}", url, e),
                    }
                }
                else => break,
            }
        }
    }))
}
