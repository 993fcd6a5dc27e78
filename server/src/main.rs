use freight_server::config::Config;
use freight_server::http::{create_router, AppState};
use freight_server::providers::{CarrierProvider, NavlungoProvider};
use std::sync::Arc;
use std::time::SystemTime;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenvy::dotenv() {
        Ok(path) => eprintln!("✅ .env loaded from: {:?}", path),
        Err(e) => eprintln!("⚠️  .env not found: {}", e),
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,freight_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Freight quote server starting...");

    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Config loaded");
    tracing::info!("   HTTP Addr: {}", config.http_addr);
    tracing::info!("   Quote API: {}", config.quote_api_url);
    tracing::info!("   Token file: {:?}", config.token_file);
    tracing::info!("   Headless: {}", config.headless);

    let provider: Arc<dyn CarrierProvider> = Arc::new(NavlungoProvider::new(config.clone())?);
    tracing::info!("✅ Provider ready: {}", provider.name());

    let state = AppState {
        provider: provider.clone(),
        start_time: SystemTime::now(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("🌐 Listening on http://{}", config.http_addr);
    tracing::info!("📋 Endpoints:");
    tracing::info!("   GET    /health");
    tracing::info!("   POST   /api/v1/prices");
    tracing::info!("   POST   /api/v1/prices/scrape");
    tracing::info!("   POST   /api/v1/prices/scrape/interactive");
    tracing::info!("   GET    /api/v1/session");
    tracing::info!("   POST   /api/v1/session/login");
    tracing::info!("   POST   /api/v1/session/cancel");
    tracing::info!("   DELETE /api/v1/session");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(provider.clone()))
        .await?;

    // Covers shutdowns that did not come through a signal.
    provider.shutdown().await;
    tracing::info!("👋 Server stopped");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM. Cancels pending operator waits so in-flight
/// requests can finish and release the browser.
async fn shutdown_signal(provider: Arc<dyn CarrierProvider>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Ctrl+C handler failed: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("❌ SIGTERM handler failed: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("🛑 SIGINT received"),
        _ = terminate => tracing::info!("🛑 SIGTERM received"),
    }

    provider.cancel_pending();
}
