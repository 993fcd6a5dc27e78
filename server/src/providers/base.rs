use crate::http::{ApiError, PriceRequest, QuoteResponse, SessionStatus};
use async_trait::async_trait;

#[async_trait]
pub trait CarrierProvider: Send + Sync {
    /// Carrier name
    fn name(&self) -> &str;

    /// Quotes from the carrier's HTTP API. Failures come back in the envelope.
    async fn fetch_prices(&self, request: PriceRequest) -> QuoteResponse;

    /// Quotes captured from the carrier's calculator page.
    async fn scrape_prices(&self, request: PriceRequest) -> QuoteResponse;

    /// Calculator page left open for an operator.
    async fn scrape_interactive(&self) -> QuoteResponse;

    /// Forces an interactive login. The only entry point that returns an error.
    async fn login(&self) -> Result<SessionStatus, ApiError>;

    fn session_status(&self) -> SessionStatus;

    async fn invalidate_session(&self);

    /// Ends any login wait or interactive scrape in progress.
    fn cancel_pending(&self);

    /// Releases the browser.
    async fn shutdown(&self);
}
