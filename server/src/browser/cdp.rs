use crate::config::Config;
use crate::http::ApiError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Launch Chrome over CDP and keep its event handler running.
pub async fn create_cdp_browser(config: &Config) -> Result<Browser, ApiError> {
    tracing::info!("🚀 Launching CDP browser (headless: {})", config.headless);

    let lang_arg = format!(
        "--lang={}",
        config.accept_language.split(',').next().unwrap_or("en-US")
    );
    let args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--exclude-switches=enable-automation".to_string(),
        "--disable-infobars".to_string(),
        lang_arg,
    ];

    let mut builder = BrowserConfig::builder()
        .window_size(1920, 1080)
        .request_timeout(config.navigation_timeout())
        .args(args);

    if let Some(chrome_path) = &config.chrome_path {
        tracing::info!("🔍 Chrome path: {}", chrome_path);
        builder = builder.chrome_executable(chrome_path);
    }

    // The login flow needs a visible window for the operator.
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    let browser_config = builder
        .build()
        .map_err(|e| ApiError::Browser(format!("BrowserConfig build error: {}", e)))?;

    let (browser, mut handler) = Browser::launch(browser_config).await?;

    // The handler drives every CDP message; without it nothing resolves.
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::warn!("CDP event error: {:?}", e);
            }
        }
        tracing::info!("CDP handler finished");
    });

    tracing::info!("✅ CDP browser launched");

    Ok(browser)
}

/// Make the page look like an ordinary desktop browser before any site script runs.
pub async fn prepare_page(page: &Page, config: &Config) -> Result<(), ApiError> {
    let mut user_agent = SetUserAgentOverrideParams::new(config.user_agent.clone());
    user_agent.accept_language = Some(config.accept_language.clone());
    page.execute(user_agent).await?;

    let languages: Vec<String> = config
        .accept_language
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim().to_string())
        .filter(|lang| !lang.is_empty())
        .collect();
    let languages_js = serde_json::to_string(&languages)?;

    let script = format!(
        r#"
        Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
        Object.defineProperty(navigator, 'plugins', {{ get: () => [1, 2, 3, 4, 5] }});
        Object.defineProperty(navigator, 'languages', {{ get: () => {} }});
        window.chrome = window.chrome || {{ runtime: {{}} }};
        "#,
        languages_js
    );

    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
        .await?;
    tracing::debug!("✅ Page prepared (user agent, navigator overrides)");

    Ok(())
}

/// `goto` bounded by the configured navigation timeout.
pub async fn navigate(page: &Page, url: &str, timeout: Duration) -> Result<(), ApiError> {
    tracing::info!("🌐 Navigating to {}", url);

    match tokio::time::timeout(timeout, page.goto(url)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(ApiError::Browser(format!("Navigation to {} failed: {}", url, e))),
        Err(_) => Err(ApiError::Timeout(format!(
            "Navigation to {} exceeded {}s",
            url,
            timeout.as_secs()
        ))),
    }
}

/// Evaluate an expression (awaiting it if it is a promise) and return its JSON
/// value. `null` and `undefined` come back as `None`.
pub async fn evaluate_json(page: &Page, expression: &str) -> Result<Option<Value>, ApiError> {
    let params = EvaluateParams::builder()
        .expression(expression)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(ApiError::Browser)?;

    let result = page.evaluate_expression(params).await?;
    Ok(result.value().cloned().filter(|v| !v.is_null()))
}

/// Network idle wait
pub async fn wait_for_network_idle(page: &Page, timeout_secs: u64) {
    let js = r#"
        ({
            readyState: document.readyState,
            activeRequests: performance.getEntriesByType('resource')
                .filter(r => !r.responseEnd).length
        })
    "#;

    for i in 0..(timeout_secs * 2) {
        tokio::time::sleep(Duration::from_millis(500)).await;

        if let Ok(Some(value)) = evaluate_json(page, js).await {
            let ready_state = value.get("readyState").and_then(|v| v.as_str()).unwrap_or("");
            let active = value.get("activeRequests").and_then(|v| v.as_u64()).unwrap_or(u64::MAX);

            if ready_state == "complete" && active == 0 {
                tracing::debug!("✅ Network idle after {}ms", (i + 1) * 500);
                return;
            }
        }
    }

    tracing::debug!("Network idle wait gave up after {}s", timeout_secs);
}

/// Type into the first selector that resolves. Returns the selector used.
pub async fn fill_first(page: &Page, selectors: &[&'static str], text: &str) -> Option<&'static str> {
    for selector in selectors {
        if let Ok(element) = page.find_element(*selector).await {
            element.click().await.ok();
            if element.type_str(text).await.is_ok() {
                return Some(selector);
            }
        }
    }
    None
}

/// Best-effort diagnostic screenshot; failures are only logged.
pub async fn capture_screenshot(page: &Page, dir: Option<&Path>, name: &str) {
    let Some(dir) = dir else {
        return;
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!("⚠️ Screenshot dir {:?} unavailable: {}", dir, e);
        return;
    }

    let path = dir.join(format!("{}_{}.png", name, uuid::Uuid::new_v4()));
    let params = ScreenshotParams::builder().full_page(true).build();

    match page.save_screenshot(params, &path).await {
        Ok(_) => tracing::info!("📸 Screenshot: {:?}", path),
        Err(e) => tracing::warn!("⚠️ Screenshot {} failed: {}", name, e),
    }
}
