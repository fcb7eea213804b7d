//! Process-wide configuration
//!
//! Read once from the environment at startup and shared read-only through DI afterwards.

use serde::Serialize;
use std::env;
use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TITLE: &str = "Chatbot -- nusantara:0.8b-q8_0 -- Ollama";
const DEFAULT_MODEL: &str = "nusantara:0.8b-q8_0";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
const DEFAULT_TIMEOUT_SECS: u64 = 180;
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got `{value}`: {source}")]
    InvalidTimeout {
        key: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub title: String,
    pub model_name: String,
    pub ollama_url: String,
    #[serde(skip)]
    pub request_timeout: Duration,
    #[serde(skip)]
    pub bind_address: String,
    pub theme: Theme,
}

/// Colors and fonts rendered into the landing page stylesheet.
#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub bg_color: String,
    pub text_color: String,
    pub entry_bg: String,
    pub button_bg: String,
    pub button_fg: String,
    pub user_prefix_color: String,
    pub bot_prefix_color: String,
    pub error_color: String,
    pub font_family: String,
    pub font_size_general: String,
    pub font_size_prefix: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg_color: "#282c34".to_owned(),
            text_color: "#abb2bf".to_owned(),
            entry_bg: "#1c1f24".to_owned(),
            button_bg: "#61afef".to_owned(),
            button_fg: "#282c34".to_owned(),
            user_prefix_color: "#61afef".to_owned(),
            bot_prefix_color: "#98c379".to_owned(),
            error_color: "#e06c75".to_owned(),
            font_family: "Arial, sans-serif".to_owned(),
            font_size_general: "14px".to_owned(),
            font_size_prefix: "15px".to_owned(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            title: DEFAULT_TITLE.to_owned(),
            model_name: DEFAULT_MODEL.to_owned(),
            ollama_url: DEFAULT_OLLAMA_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            theme: Theme::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let var = |key: &str, default: String| lookup(key).unwrap_or(default);

        let request_timeout = match lookup("OLLAMA_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.trim().parse().map_err(|source| {
                    ConfigError::InvalidTimeout {
                        key: "OLLAMA_TIMEOUT_SECS",
                        value: value.clone(),
                        source,
                    }
                })?;
                if secs == 0 {
                    return Err(ConfigError::ZeroTimeout("OLLAMA_TIMEOUT_SECS"));
                }
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        let theme = defaults.theme;
        let config = AppConfig {
            title: var("CHAT_TITLE", defaults.title),
            model_name: var("OLLAMA_MODEL", defaults.model_name),
            ollama_url: var("OLLAMA_URL", defaults.ollama_url),
            request_timeout,
            bind_address: var("BIND_ADDRESS", defaults.bind_address),
            theme: Theme {
                bg_color: var("THEME_BG_COLOR", theme.bg_color),
                text_color: var("THEME_TEXT_COLOR", theme.text_color),
                entry_bg: var("THEME_ENTRY_BG", theme.entry_bg),
                button_bg: var("THEME_BUTTON_BG", theme.button_bg),
                button_fg: var("THEME_BUTTON_FG", theme.button_fg),
                user_prefix_color: var("THEME_USER_PREFIX_COLOR", theme.user_prefix_color),
                bot_prefix_color: var("THEME_BOT_PREFIX_COLOR", theme.bot_prefix_color),
                error_color: var("THEME_ERROR_COLOR", theme.error_color),
                font_family: var("THEME_FONT_FAMILY", theme.font_family),
                font_size_general: var("THEME_FONT_SIZE_GENERAL", theme.font_size_general),
                font_size_prefix: var("THEME_FONT_SIZE_PREFIX", theme.font_size_prefix),
            },
        };

        for (key, value) in [
            ("OLLAMA_URL", &config.ollama_url),
            ("OLLAMA_MODEL", &config.model_name),
            ("BIND_ADDRESS", &config.bind_address),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(key));
            }
        }

        Ok(config)
    }
}
