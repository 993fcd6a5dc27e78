use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A credential is treated as absent once it is this close to expiry.
pub const EXPIRY_SAFETY_MARGIN_MS: i64 = 5 * 60 * 1000;

/// Bearer token harvested from the carrier portal, as stored in the token file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCredential {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix epoch milliseconds.
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl CachedCredential {
    pub fn is_usable(&self, now_ms: i64) -> bool {
        self.expires_at - now_ms > EXPIRY_SAFETY_MARGIN_MS
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at).single()
    }
}

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Builds a credential from a client-storage record.
///
/// Understands the Firebase `authUser` record (`stsTokenManager` nested), the
/// IndexedDB wrapper around it (`{fbase_key, value}`), and a flat
/// `{accessToken, refreshToken, expiresAt}` object. Expiry may be a number or a
/// numeric string.
pub fn parse_token_record(record: &Value) -> Option<CachedCredential> {
    if let Some(inner) = record.get("value").filter(|v| v.is_object()) {
        if record.get("fbase_key").is_some() {
            return parse_token_record(inner);
        }
    }

    let tokens = record.get("stsTokenManager").unwrap_or(record);

    let access_token = non_empty_str(tokens.get("accessToken"))?;
    let refresh_token = non_empty_str(tokens.get("refreshToken")).unwrap_or_default();
    let expires_at = tokens
        .get("expirationTime")
        .or_else(|| tokens.get("expiresAt"))
        .and_then(as_millis)?;

    let user_id = non_empty_str(record.get("uid")).or_else(|| non_empty_str(record.get("userId")));

    Some(CachedCredential {
        access_token,
        refresh_token,
        expires_at,
        user_id,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn as_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
