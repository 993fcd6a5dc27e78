use crate::http::{ApiError, AppState, HealthResponse, PriceRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/prices", post(prices_handler))
        .route("/api/v1/prices/scrape", post(scrape_handler))
        .route("/api/v1/prices/scrape/interactive", post(interactive_scrape_handler))
        .route(
            "/api/v1/session",
            get(session_status_handler).delete(invalidate_session_handler),
        )
        .route("/api/v1/session/login", post(login_handler))
        .route("/api/v1/session/cancel", post(cancel_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state
        .start_time
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let response = HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: Utc::now(),
    };

    (StatusCode::OK, Json(response))
}

async fn prices_handler(
    State(state): State<AppState>,
    Json(request): Json<PriceRequest>,
) -> impl IntoResponse {
    tracing::info!("📥 Price request via API: {} -> {}", request.origin_country, request.destination_country);
    let response = state.provider.fetch_prices(request).await;
    (StatusCode::OK, Json(response))
}

async fn scrape_handler(
    State(state): State<AppState>,
    Json(request): Json<PriceRequest>,
) -> impl IntoResponse {
    tracing::info!("📥 Price request via calculator: {} -> {}", request.origin_country, request.destination_country);
    let response = state.provider.scrape_prices(request).await;
    (StatusCode::OK, Json(response))
}

async fn interactive_scrape_handler(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("📥 Interactive calculator session requested");
    let response = state.provider.scrape_interactive().await;
    (StatusCode::OK, Json(response))
}

async fn session_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.provider.session_status()))
}

async fn login_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("📥 Login requested for {}", state.provider.name());
    let status = state.provider.login().await?;
    Ok((StatusCode::OK, Json(status)))
}

async fn cancel_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.provider.cancel_pending();
    StatusCode::ACCEPTED
}

async fn invalidate_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.provider.invalidate_session().await;
    StatusCode::NO_CONTENT
}
