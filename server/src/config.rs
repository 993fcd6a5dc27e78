use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,

    // Navlungo
    pub login_url: String,
    pub calculator_url: String,
    pub quote_api_url: String,
    pub email: String,
    pub password: String,
    pub token_file: PathBuf,

    // Browser
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub user_agent: String,
    pub accept_language: String,
    pub screenshot_dir: Option<PathBuf>,

    // Timeouts
    pub login_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub login_settle_ms: u64,
    pub scrape_settle_ms: u64,
    pub interactive_window_ms: u64,
    pub request_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        // No fallback literals: a missing credential is a deployment error.
        let mut config = Config::with_credentials(
            required("NAVLUNGO_EMAIL")?,
            required("NAVLUNGO_PASSWORD")?,
        );

        if let Ok(addr) = env::var("HTTP_ADDR") {
            config.http_addr = addr;
        }
        if let Ok(url) = env::var("NAVLUNGO_LOGIN_URL") {
            config.login_url = url;
        }
        if let Ok(url) = env::var("NAVLUNGO_CALCULATOR_URL") {
            config.calculator_url = url;
        }
        if let Ok(url) = env::var("NAVLUNGO_QUOTE_API_URL") {
            config.quote_api_url = url;
        }
        if let Ok(path) = env::var("TOKEN_FILE") {
            config.token_file = PathBuf::from(path);
        }
        if let Ok(ua) = env::var("USER_AGENT") {
            config.user_agent = ua;
        }
        if let Ok(lang) = env::var("ACCEPT_LANGUAGE") {
            config.accept_language = lang;
        }
        config.chrome_path = env::var("CHROME_PATH").ok().filter(|s| !s.is_empty());
        config.screenshot_dir = env::var("SCREENSHOT_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        config.headless = parse_or("HEADLESS", config.headless)?;
        config.login_timeout_ms = parse_or("LOGIN_TIMEOUT_MS", config.login_timeout_ms)?;
        config.navigation_timeout_ms = parse_or("NAVIGATION_TIMEOUT_MS", config.navigation_timeout_ms)?;
        config.login_settle_ms = parse_or("LOGIN_SETTLE_MS", config.login_settle_ms)?;
        config.scrape_settle_ms = parse_or("SCRAPE_SETTLE_MS", config.scrape_settle_ms)?;
        config.interactive_window_ms = parse_or("INTERACTIVE_WINDOW_MS", config.interactive_window_ms)?;
        config.request_timeout_ms = parse_or("REQUEST_TIMEOUT_MS", config.request_timeout_ms)?;

        Ok(config)
    }

    /// Defaults for everything except the carrier credentials.
    pub fn with_credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Config {
            http_addr: "0.0.0.0:8099".to_string(),
            login_url: "https://app.navlungo.com/login".to_string(),
            calculator_url: "https://app.navlungo.com/price-calculator".to_string(),
            quote_api_url: "https://quote-search.navlungo.com".to_string(),
            email: email.into(),
            password: password.into(),
            token_file: PathBuf::from("./data/navlungo_token.json"),
            chrome_path: None,
            headless: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9,tr;q=0.8".to_string(),
            screenshot_dir: None,
            login_timeout_ms: 120_000,
            navigation_timeout_ms: 60_000,
            login_settle_ms: 3_000,
            scrape_settle_ms: 10_000,
            interactive_window_ms: 300_000,
            request_timeout_ms: 90_000,
        }
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    pub fn scrape_settle(&self) -> Duration {
        Duration::from_millis(self.scrape_settle_ms)
    }

    pub fn interactive_window(&self) -> Duration {
        Duration::from_millis(self.interactive_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Path segment that identifies the login page in a URL.
    pub fn login_path(&self) -> String {
        reqwest::Url::parse(&self.login_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/login".to_string())
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_path_from_url() {
        let config = Config::with_credentials("ops@example.com", "secret");
        assert_eq!(config.login_path(), "/login");
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        env::set_var("FREIGHT_TEST_TIMEOUT", "soon");
        let result: Result<u64, _> = parse_or("FREIGHT_TEST_TIMEOUT", 5);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        env::remove_var("FREIGHT_TEST_TIMEOUT");
    }
}
