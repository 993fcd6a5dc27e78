pub mod credential;
pub mod manager;
pub mod store;
pub mod wait;

pub use credential::{parse_token_record, CachedCredential, Clock, SystemClock, EXPIRY_SAFETY_MARGIN_MS};
pub use manager::{Authenticator, TokenManager};
pub use store::TokenStore;
pub use wait::{unless_cancelled, wait_for_login, AuthStage, LoginProbe};
