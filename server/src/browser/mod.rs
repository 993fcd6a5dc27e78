pub mod cdp;
pub mod session;

pub use cdp::{capture_screenshot, create_cdp_browser, evaluate_json, navigate};
pub use session::{BrowserSession, PageLease};
