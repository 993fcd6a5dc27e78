#![allow(dead_code)]

use async_trait::async_trait;
use freight_server::http::ApiError;
use freight_server::providers::navlungo::{QuoteTransport, TransportResponse};
use freight_server::session::{
    AuthStage, Authenticator, CachedCredential, Clock, TokenManager, TokenStore,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub const NOW: i64 = 1_760_000_000_000;
pub const HOUR_MS: i64 = 3_600_000;

pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(now_ms: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now_ms)))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Hands out `fresh-1`, `fresh-2`, ... valid for an hour, or fails when told to.
pub struct CountingAuthenticator {
    calls: AtomicUsize,
    clock: Arc<FixedClock>,
    fail: bool,
}

impl CountingAuthenticator {
    pub fn new(clock: Arc<FixedClock>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            clock,
            fail: false,
        })
    }

    pub fn failing(clock: Arc<FixedClock>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            clock,
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn authenticate(&self, _cancel: CancellationToken) -> Result<CachedCredential, ApiError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(ApiError::LoginTimeout(120));
        }

        Ok(CachedCredential {
            access_token: format!("fresh-{}", n),
            refresh_token: format!("refresh-{}", n),
            expires_at: self.clock.now_ms() + HOUR_MS,
            user_id: Some("user-1".to_string()),
        })
    }

    fn stage(&self) -> AuthStage {
        AuthStage::Idle
    }
}

pub fn credential(token: &str, expires_at: i64) -> CachedCredential {
    CachedCredential {
        access_token: token.to_string(),
        refresh_token: "r".to_string(),
        expires_at,
        user_id: None,
    }
}

pub fn token_manager(
    authenticator: Arc<CountingAuthenticator>,
    clock: Arc<FixedClock>,
    token_file: &Path,
) -> Arc<TokenManager> {
    Arc::new(TokenManager::new(
        authenticator,
        TokenStore::new(token_file),
        clock,
    ))
}

/// Replays canned responses and records the bearer token of every call.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, ApiError>>>,
    tokens: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(TransportResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(&self, error: ApiError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteTransport for ScriptedTransport {
    async fn post_quote(&self, _url: &str, token: &str, body: &Value) -> Result<TransportResponse, ApiError> {
        self.tokens.lock().unwrap().push(token.to_string());
        self.bodies.lock().unwrap().push(body.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response left".to_string())))
    }
}
