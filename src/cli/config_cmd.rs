//! `voicenote config`: read and edit the settings file

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::duration::Duration;
use crate::domain::error::ConfigError;

use super::args::{ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// One editable key of the settings file
#[derive(Debug, Clone, Copy, PartialEq)]
enum Setting {
    ApiUrl,
    WsUrl,
    Token,
    DefaultProject,
    Notify,
    WatchTimeout,
    SkipSeconds,
}

impl Setting {
    fn parse(key: &str) -> Result<Self, ConfigError> {
        let setting = match key {
            "api_url" => Self::ApiUrl,
            "ws_url" => Self::WsUrl,
            "token" => Self::Token,
            "default_project" => Self::DefaultProject,
            "notify" => Self::Notify,
            "watch_timeout" => Self::WatchTimeout,
            "skip_seconds" => Self::SkipSeconds,
            _ => {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
                })
            }
        };
        Ok(setting)
    }

    /// Current value as shown to the user; tokens are masked
    fn read(self, config: &AppConfig) -> Option<String> {
        match self {
            Self::ApiUrl => config.api_url.clone(),
            Self::WsUrl => config.ws_url.clone(),
            Self::Token => config.token.as_deref().map(mask_token),
            Self::DefaultProject => config.default_project.clone(),
            Self::Notify => config.notify.map(|on| on.to_string()),
            Self::WatchTimeout => config.watch_timeout.clone(),
            Self::SkipSeconds => config.skip_seconds.map(|s| s.to_string()),
        }
    }

    fn write(self, config: &mut AppConfig, value: &str) -> Result<(), String> {
        match self {
            Self::ApiUrl => config.api_url = Some(with_scheme(value, "http://", "https://")?),
            Self::WsUrl => config.ws_url = Some(with_scheme(value, "ws://", "wss://")?),
            Self::Token => config.token = Some(value.to_string()),
            Self::DefaultProject => config.default_project = Some(value.to_string()),
            Self::Notify => {
                config.notify = Some(parse_switch(value).ok_or("Value must be 'true' or 'false'")?)
            }
            Self::WatchTimeout => {
                // Stored as written; the parse only validates it
                value.parse::<Duration>().map_err(|e| e.to_string())?;
                config.watch_timeout = Some(value.to_string());
            }
            Self::SkipSeconds => {
                let seconds = value
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or("Value must be a positive whole number")?;
                config.skip_seconds = Some(seconds);
            }
        }
        Ok(())
    }
}

/// Run one `config` action against `store`
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => {
            store.init().await?;
            presenter.success(&format!("Config file created at: {}", store.path().display()));
        }
        ConfigAction::Path => presenter.output(&store.path().to_string_lossy()),
        ConfigAction::Get { key } => {
            let setting = Setting::parse(&key)?;
            let config = store.load().await?;
            presenter.output(setting.read(&config).as_deref().unwrap_or(NOT_SET));
        }
        ConfigAction::List => {
            let config = store.load().await?;
            for key in VALID_CONFIG_KEYS {
                let shown = Setting::parse(key)?.read(&config);
                presenter.key_value(key, shown.as_deref().unwrap_or(NOT_SET));
            }
        }
        ConfigAction::Set { key, value } => {
            let setting = Setting::parse(&key)?;
            let mut config = store.load().await?;
            setting
                .write(&mut config, &value)
                .map_err(|message| ConfigError::Invalid {
                    key: key.clone(),
                    message,
                })?;
            store.save(&config).await?;
            let shown = setting.read(&config).unwrap_or_default();
            presenter.success(&format!("{key} = {shown}"));
        }
    }
    Ok(())
}

/// Accept `value` only under `plain` or `secure`, without a trailing slash
fn with_scheme(value: &str, plain: &str, secure: &str) -> Result<String, String> {
    if !value.starts_with(plain) && !value.starts_with(secure) {
        return Err(format!("Value must start with {plain} or {secure}"));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Keep four characters at each end of long tokens
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = token.chars().take(4).collect();
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{head}...{tail}")
}
