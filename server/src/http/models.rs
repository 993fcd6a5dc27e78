use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DIMENSION_CM: f64 = 20.0;
pub const DEFAULT_CURRENCY: &str = "USD";

/// Volumetric divisor used by the carrier for air/express freight.
pub const VOLUMETRIC_DIVISOR: f64 = 5000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub origin_country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_postal_code: Option<String>,
    pub destination_country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_postal_code: Option<String>,
    /// Actual weight in kg.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default = "default_package_count")]
    pub package_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_value: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_package_count() -> u32 {
    1
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl PriceRequest {
    pub fn new(origin_country: impl Into<String>, destination_country: impl Into<String>, weight: f64) -> Self {
        Self {
            origin_country: origin_country.into(),
            origin_city: None,
            origin_postal_code: None,
            destination_country: destination_country.into(),
            destination_city: None,
            destination_postal_code: None,
            weight,
            length: None,
            width: None,
            height: None,
            package_count: default_package_count(),
            declared_value: None,
            currency: default_currency(),
        }
    }

    pub fn with_dimensions(mut self, length: f64, width: f64, height: f64) -> Self {
        self.length = Some(length);
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// (length, width, height) in cm with missing sides defaulted.
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            self.length.unwrap_or(DEFAULT_DIMENSION_CM),
            self.width.unwrap_or(DEFAULT_DIMENSION_CM),
            self.height.unwrap_or(DEFAULT_DIMENSION_CM),
        )
    }

    pub fn package_count(&self) -> u32 {
        self.package_count.max(1)
    }

    /// Volumetric weight of a single package in kg.
    pub fn volumetric_weight(&self) -> f64 {
        let (l, w, h) = self.dimensions();
        l * w * h / VOLUMETRIC_DIVISOR
    }

    /// Billable weight across all packages.
    pub fn chargeable_weight(&self) -> f64 {
        self.weight.max(self.volumetric_weight()) * self.package_count() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub carrier: String,
    pub service: String,
    pub price: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub success: bool,
    #[serde(default)]
    pub quotes: Vec<PriceQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuoteResponse {
    pub fn ok(quotes: Vec<PriceQuote>) -> Self {
        Self {
            success: true,
            quotes,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            quotes: vec![],
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub stage: crate::session::AuthStage,
}
