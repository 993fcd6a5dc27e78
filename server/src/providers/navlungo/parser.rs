use crate::http::{PriceQuote, QuoteResponse, DEFAULT_CURRENCY};
use crate::utils::parse_price;
use serde_json::Value;

/// Normalizes whatever the carrier returned into quote records.
///
/// Accepted shapes: a bare array, `{quotes: [...]}`, and `{data: ...}` where
/// `data` is a single quote or an array. Anything else yields a successful
/// response with no quotes; the carrier uses the same shape for "no offers",
/// so the two cannot be told apart here.
pub fn normalize_quotes(raw: &Value) -> QuoteResponse {
    match quote_items(raw) {
        Some(items) => QuoteResponse::ok(items.into_iter().filter_map(normalize_quote).collect()),
        None => {
            tracing::warn!("⚠️ Unrecognized quote payload shape, treating as no quotes");
            QuoteResponse::ok(vec![])
        }
    }
}

fn quote_items(raw: &Value) -> Option<Vec<&Value>> {
    if let Some(items) = raw.as_array() {
        return Some(items.iter().collect());
    }

    if let Some(items) = raw.get("quotes").and_then(Value::as_array) {
        return Some(items.iter().collect());
    }

    match raw.get("data") {
        Some(Value::Array(items)) => Some(items.iter().collect()),
        Some(item @ Value::Object(_)) => Some(vec![item]),
        _ => None,
    }
}

/// One upstream item to a quote. Non-object items are skipped.
fn normalize_quote(item: &Value) -> Option<PriceQuote> {
    item.as_object()?;

    Some(PriceQuote {
        carrier: text(item, "carrier").unwrap_or_else(|| "Unknown".to_string()),
        service: text(item, "service").unwrap_or_else(|| "Standard".to_string()),
        price: item.get("price").and_then(price_value).unwrap_or(0.0),
        currency: text(item, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        transit_days: item.get("transitDays").and_then(days_value),
        transit_time: text(item, "transitTime"),
    })
}

fn text(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn price_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(s).ok(),
        _ => None,
    }
}

fn days_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|d| u32::try_from(d).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ups_express() -> Value {
        json!({
            "carrier": "UPS",
            "service": "Express",
            "price": 42.5,
            "currency": "USD",
            "transitDays": 3
        })
    }

    fn expected() -> Vec<PriceQuote> {
        vec![PriceQuote {
            carrier: "UPS".to_string(),
            service: "Express".to_string(),
            price: 42.5,
            currency: "USD".to_string(),
            transit_days: Some(3),
            transit_time: None,
        }]
    }

    #[test]
    fn test_all_shapes_normalize_the_same() {
        let shapes = [
            json!([ups_express()]),
            json!({ "quotes": [ups_express()] }),
            json!({ "data": ups_express() }),
            json!({ "data": [ups_express()] }),
        ];

        for shape in shapes {
            let response = normalize_quotes(&shape);
            assert!(response.success);
            assert_eq!(response.quotes, expected(), "shape: {}", shape);
        }
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let response = normalize_quotes(&json!([{}]));
        assert_eq!(
            response.quotes,
            vec![PriceQuote {
                carrier: "Unknown".to_string(),
                service: "Standard".to_string(),
                price: 0.0,
                currency: "USD".to_string(),
                transit_days: None,
                transit_time: None,
            }]
        );
    }

    #[test]
    fn test_string_prices_and_transit_time() {
        let response = normalize_quotes(&json!({
            "quotes": [
                { "carrier": "DHL", "price": "1.234,50", "currency": "EUR", "transitTime": "2-4 days" },
                "not a quote"
            ]
        }));

        assert_eq!(response.quotes.len(), 1);
        assert_eq!(response.quotes[0].price, 1234.5);
        assert_eq!(response.quotes[0].currency, "EUR");
        assert_eq!(response.quotes[0].transit_time.as_deref(), Some("2-4 days"));
    }

    #[test]
    fn test_unrecognized_shape_is_empty_success() {
        for raw in [json!({ "message": "ok" }), json!("text"), json!(null), json!({ "data": 5 })] {
            let response = normalize_quotes(&raw);
            assert!(response.success);
            assert!(response.quotes.is_empty());
            assert!(response.error.is_none());
        }
    }
}
