use crate::http::{ApiError, PriceRequest, QuoteResponse};
use crate::providers::navlungo::parser::normalize_quotes;
use crate::session::TokenManager;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Status and body of a quote API call.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_rejection(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

#[async_trait]
pub trait QuoteTransport: Send + Sync {
    async fn post_quote(&self, url: &str, token: &str, body: &Value) -> Result<TransportResponse, ApiError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl QuoteTransport for ReqwestTransport {
    async fn post_quote(&self, url: &str, token: &str, body: &Value) -> Result<TransportResponse, ApiError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Carrier API body: origin/destination/cargo nested, dimensions defaulted.
pub fn build_quote_body(request: &PriceRequest) -> Value {
    let (length, width, height) = request.dimensions();

    json!({
        "origin": {
            "country": request.origin_country,
            "city": request.origin_city,
            "postalCode": request.origin_postal_code,
        },
        "destination": {
            "country": request.destination_country,
            "city": request.destination_city,
            "postalCode": request.destination_postal_code,
        },
        "cargo": {
            "weight": request.weight,
            "length": length,
            "width": width,
            "height": height,
            "packageCount": request.package_count(),
            "declaredValue": request.declared_value,
            "currency": request.currency,
        },
    })
}

/// Fetches quotes over the carrier's HTTP API.
pub struct QuoteRequester {
    transport: Arc<dyn QuoteTransport>,
    tokens: Arc<TokenManager>,
    endpoint: String,
}

impl QuoteRequester {
    pub fn new(transport: Arc<dyn QuoteTransport>, tokens: Arc<TokenManager>, api_base: &str) -> Self {
        Self {
            transport,
            tokens,
            endpoint: format!("{}/quotes", api_base.trim_end_matches('/')),
        }
    }

    /// Never fails: every error is folded into the envelope.
    pub async fn get_prices(&self, request: &PriceRequest) -> QuoteResponse {
        tracing::info!(
            "📦 Quote request {} -> {} ({} kg chargeable)",
            request.origin_country,
            request.destination_country,
            request.chargeable_weight()
        );

        match self.fetch(request).await {
            Ok(response) => {
                tracing::info!("✅ {} quotes received", response.quotes.len());
                response
            }
            Err(e) => {
                tracing::error!("❌ Quote request failed: {}", e);
                QuoteResponse::failure(e.to_string())
            }
        }
    }

    async fn fetch(&self, request: &PriceRequest) -> Result<QuoteResponse, ApiError> {
        let body = build_quote_body(request);
        let token = self.tokens.get_access_token().await?;

        let response = match self.send(&token, &body).await {
            Err(e) if e.is_auth_rejection() => {
                tracing::warn!("⚠️ Token rejected ({}), logging in again and retrying once", e);
                let token = self.tokens.renew_rejected(&token).await?;
                self.send(&token, &body).await?
            }
            other => other?,
        };

        let raw: Value = serde_json::from_str(&response)?;
        Ok(normalize_quotes(&raw))
    }

    async fn send(&self, token: &str, body: &Value) -> Result<String, ApiError> {
        let response = self.transport.post_quote(&self.endpoint, token, body).await?;

        if response.is_success() {
            return Ok(response.body);
        }

        let detail = format!("HTTP {}: {}", response.status, truncate(&response.body, 200));
        if response.is_auth_rejection() {
            Err(ApiError::Unauthorized(detail))
        } else {
            Err(ApiError::Transport(detail))
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_defaults_dimensions_and_count() {
        let body = build_quote_body(&PriceRequest::new("TR", "US", 1.0));

        assert_eq!(body["origin"]["country"], "TR");
        assert_eq!(body["destination"]["country"], "US");
        assert_eq!(body["cargo"]["length"], 20.0);
        assert_eq!(body["cargo"]["width"], 20.0);
        assert_eq!(body["cargo"]["height"], 20.0);
        assert_eq!(body["cargo"]["packageCount"], 1);
        assert_eq!(body["cargo"]["currency"], "USD");
    }

    #[test]
    fn test_body_keeps_given_dimensions() {
        let body = build_quote_body(&PriceRequest::new("TR", "US", 1.0).with_dimensions(20.0, 15.0, 10.0));
        assert_eq!(body["cargo"]["width"], 15.0);
        assert_eq!(body["cargo"]["height"], 10.0);
    }
}
