//! Shared runtime context for the command runners

use std::env;
use std::sync::Arc;

use crate::application::ports::{ConfigStore, StatusTransport};
use crate::application::UploadConfig;
use crate::domain::auth::Credentials;
use crate::domain::config::AppConfig;
use crate::domain::duration::Duration;
use crate::domain::error::{ConfigError, DurationParseError};
use crate::infrastructure::{HttpNotesApi, WsStatusTransport, XdgConfigStore};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment overrides
pub const ENV_API_URL: &str = "VOICENOTE_API_URL";
pub const ENV_TOKEN: &str = "VOICENOTE_TOKEN";

/// Merged settings plus the session credentials
pub struct AppContext {
    pub config: AppConfig,
    pub credentials: Credentials,
    pub store: XdgConfigStore,
}

impl AppContext {
    pub fn new(config: AppConfig, store: XdgConfigStore) -> Self {
        let credentials = Credentials::from_token(config.token());
        Self {
            config,
            credentials,
            store,
        }
    }

    /// REST client sharing this context's credentials
    pub fn api(&self) -> HttpNotesApi {
        HttpNotesApi::new(self.config.api_url_or_default(), self.credentials.clone())
    }

    pub fn transport(&self) -> Arc<dyn StatusTransport> {
        Arc::new(WsStatusTransport::new(self.config.ws_url_or_default()))
    }

    /// Upload settings; `notify` from the command line wins over config
    pub fn upload_config(&self, notify: bool) -> Result<UploadConfig, DurationParseError> {
        Ok(UploadConfig {
            notify: notify || self.config.notify_or_default(),
            watch_timeout: self.watch_timeout()?,
        })
    }

    /// Configured watch timeout; a malformed value is an error
    pub fn watch_timeout(&self) -> Result<Option<Duration>, DurationParseError> {
        self.config
            .watch_timeout
            .as_deref()
            .map(str::parse::<Duration>)
            .transpose()
    }

    pub fn skip_seconds(&self) -> f64 {
        self.config.skip_seconds_or_default() as f64
    }

    /// Persist a new token, or remove it with None
    pub async fn store_token(&self, token: Option<String>) -> Result<(), ConfigError> {
        let mut stored = self.store.load().await?;
        stored.token = token.clone();
        self.store.save(&stored).await?;
        match token {
            Some(token) => self.credentials.set(token),
            None => self.credentials.invalidate(),
        }
        Ok(())
    }
}

/// Settings taken from the environment
pub fn env_config() -> AppConfig {
    AppConfig {
        api_url: env::var(ENV_API_URL).ok().filter(|s| !s.is_empty()),
        token: env::var(ENV_TOKEN).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
