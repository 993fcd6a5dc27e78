use crate::browser::cdp::{create_cdp_browser, prepare_page};
use crate::config::Config;
use crate::http::ApiError;
use chromiumoxide::browser::Browser;
use chromiumoxide::Page;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// The process's single browser, launched on first use.
///
/// Pages are handed out as [`PageLease`]s. A lease holds the browser lock for
/// its whole lifetime, so browser work is serialized: one login or scrape at a
/// time. Callers must not request a token from the token manager while holding
/// a lease, since a login needs a lease of its own.
pub struct BrowserSession {
    config: Arc<Config>,
    browser: Arc<Mutex<Option<Browser>>>,
}

impl BrowserSession {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            browser: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits for exclusive use of the browser and opens a prepared blank page.
    pub async fn lease(&self) -> Result<PageLease, ApiError> {
        let mut guard = self.browser.clone().lock_owned().await;

        let page = match open_page(&mut guard, &self.config).await {
            Ok(page) => page,
            Err(e) => {
                // The browser may have been closed by hand; relaunch once.
                tracing::warn!("⚠️ Could not open a page ({}), relaunching browser", e);
                if let Some(mut stale) = guard.take() {
                    let _ = stale.close().await;
                }
                open_page(&mut guard, &self.config).await?
            }
        };

        let lease = PageLease {
            page,
            released: false,
            _guard: guard,
        };
        prepare_page(&lease, &self.config).await?;

        Ok(lease)
    }

    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    /// Shuts the browser down. Waits for any outstanding lease first.
    pub async fn close(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            tracing::info!("🛑 Closing browser");
            if let Err(e) = browser.close().await {
                tracing::warn!("⚠️ Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
    }
}

async fn open_page(slot: &mut Option<Browser>, config: &Config) -> Result<Page, ApiError> {
    if slot.is_none() {
        *slot = Some(create_cdp_browser(config).await?);
    }

    match slot.as_ref() {
        Some(browser) => Ok(browser.new_page("about:blank").await?),
        None => Err(ApiError::Browser("browser not available".to_string())),
    }
}

/// A page with exclusive use of the browser. The page is closed by
/// [`PageLease::release`], or from `Drop` if the lease is abandoned.
pub struct PageLease {
    page: Page,
    released: bool,
    _guard: OwnedMutexGuard<Option<Browser>>,
}

impl PageLease {
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.page.clone().close().await {
            tracing::warn!("⚠️ Page close failed: {}", e);
        }
    }
}

impl Deref for PageLease {
    type Target = Page;

    fn deref(&self) -> &Page {
        &self.page
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let page = self.page.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}
