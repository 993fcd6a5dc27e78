mod common;

use common::*;
use freight_server::http::ApiError;
use freight_server::session::{TokenStore, EXPIRY_SAFETY_MARGIN_MS};

#[tokio::test]
async fn test_usable_token_in_memory_never_logs_in_again() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock.clone(), &dir.path().join("token.json"));

    assert_eq!(tokens.get_access_token().await.unwrap(), "fresh-1");

    // 54 minutes later the token is still more than 5 minutes from expiry.
    clock.advance(54 * 60 * 1000);
    for _ in 0..3 {
        assert_eq!(tokens.get_access_token().await.unwrap(), "fresh-1");
    }
    assert_eq!(auth.calls(), 1);
}

#[tokio::test]
async fn test_token_inside_safety_margin_triggers_one_login() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock.clone(), &dir.path().join("token.json"));

    tokens.get_access_token().await.unwrap();
    assert_eq!(auth.calls(), 1);

    // Four minutes left: treated as absent. The token file holds the same
    // near-expiry credential, so it must not be reused either.
    clock.advance(HOUR_MS - 4 * 60 * 1000);
    assert_eq!(tokens.get_access_token().await.unwrap(), "fresh-2");
    assert_eq!(auth.calls(), 2);

    assert_eq!(tokens.get_access_token().await.unwrap(), "fresh-2");
    assert_eq!(auth.calls(), 2);
}

#[tokio::test]
async fn test_expired_stored_token_triggers_exactly_one_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    TokenStore::new(&path)
        .save(&credential("stale", NOW + EXPIRY_SAFETY_MARGIN_MS - 1))
        .unwrap();

    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock, &path);

    assert_eq!(tokens.get_access_token().await.unwrap(), "fresh-1");
    assert_eq!(auth.calls(), 1);
}

#[tokio::test]
async fn test_valid_token_file_is_loaded_without_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"accessToken":"abc","refreshToken":"r","expiresAt":{}}}"#,
            NOW + HOUR_MS
        ),
    )
    .unwrap();

    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock, &path);

    assert_eq!(tokens.get_access_token().await.unwrap(), "abc");
    assert_eq!(auth.calls(), 0);
    assert!(tokens.status().authenticated);
}

#[tokio::test]
async fn test_fresh_login_overwrites_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let store = TokenStore::new(&path);
    store.save(&credential("old", NOW - 1)).unwrap();

    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth, clock, &path);

    tokens.get_access_token().await.unwrap();

    let saved = store.load().unwrap();
    assert_eq!(saved.access_token, "fresh-1");
    assert_eq!(saved.expires_at, NOW + HOUR_MS);
}

#[tokio::test]
async fn test_refresh_skips_memory_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    TokenStore::new(&path)
        .save(&credential("rejected", NOW + HOUR_MS))
        .unwrap();

    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock, &path);

    assert_eq!(tokens.get_access_token().await.unwrap(), "rejected");
    tokens.invalidate().await;
    assert_eq!(tokens.refresh_access_token().await.unwrap(), "fresh-1");
    assert_eq!(auth.calls(), 1);
}

#[tokio::test]
async fn test_invalidate_keeps_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock, &path);

    tokens.get_access_token().await.unwrap();
    tokens.invalidate().await;

    assert!(!tokens.status().authenticated);
    assert!(path.exists());
    // The file still holds a usable token, so no second login.
    assert_eq!(tokens.get_access_token().await.unwrap(), "fresh-1");
    assert_eq!(auth.calls(), 1);
}

#[tokio::test]
async fn test_login_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::failing(clock.clone());
    let tokens = token_manager(auth.clone(), clock, &dir.path().join("token.json"));

    let result = tokens.get_access_token().await;

    assert!(matches!(result, Err(ApiError::LoginTimeout(120))));
    assert_eq!(auth.calls(), 1);
    assert!(!dir.path().join("token.json").exists());
}

#[tokio::test]
async fn test_renew_rejected_logs_in_once_per_rejected_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    TokenStore::new(&path)
        .save(&credential("cached", NOW + HOUR_MS))
        .unwrap();

    let clock = FixedClock::at(NOW);
    let auth = CountingAuthenticator::new(clock.clone());
    let tokens = token_manager(auth.clone(), clock, &path);

    assert_eq!(tokens.get_access_token().await.unwrap(), "cached");
    assert_eq!(tokens.renew_rejected("cached").await.unwrap(), "fresh-1");
    // A second caller rejected with the same old token reuses the new one.
    assert_eq!(tokens.renew_rejected("cached").await.unwrap(), "fresh-1");
    assert_eq!(auth.calls(), 1);

    // The replacement itself being rejected forces another login.
    assert_eq!(tokens.renew_rejected("fresh-1").await.unwrap(), "fresh-2");
    assert_eq!(auth.calls(), 2);
}
