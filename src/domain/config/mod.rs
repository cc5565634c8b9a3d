//! Configuration domain module

mod app_config;

pub use app_config::{derive_ws_url, AppConfig, DEFAULT_API_URL, DEFAULT_SKIP_SECONDS};
