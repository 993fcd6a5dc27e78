pub mod browser;
pub mod config;
pub mod http;
pub mod providers;
pub mod session;
pub mod utils;
