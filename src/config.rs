//! Environment-sourced configuration, validated once at startup.
//!
//! Every value is required: the process refuses to start with a partial
//! configuration rather than failing later on the first webhook delivery.

use thiserror::Error;

/// Sentinel left in `SERVER_URL` by the bootstrap flow. While it is in
/// place, replies that link to static assets are replaced with setup
/// instructions.
pub const SERVER_URL_PLACEHOLDER: &str = "to_be_set_manually";

pub const APP_SECRET_VAR: &str = "MESSENGER_APP_SECRET";
pub const VERIFY_TOKEN_VAR: &str = "MESSENGER_VALIDATION_TOKEN";
pub const PAGE_ACCESS_TOKEN_VAR: &str = "MESSENGER_PAGE_ACCESS_TOKEN";
pub const SERVER_URL_VAR: &str = "SERVER_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// App secret from the App Dashboard, used to verify webhook signatures.
    pub app_secret: String,
    /// Arbitrary value echoed back by Meta during the subscription handshake.
    pub verify_token: String,
    /// Page access token used as the Send API credential.
    pub page_access_token: String,
    /// Public URL of this server (with protocol). Static assets and the
    /// account-linking callback are addressed relative to it.
    pub server_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an injected lookup so tests never touch the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        Ok(Self {
            app_secret: require(APP_SECRET_VAR)?,
            verify_token: require(VERIFY_TOKEN_VAR)?,
            page_access_token: require(PAGE_ACCESS_TOKEN_VAR)?,
            server_url: require(SERVER_URL_VAR)?.trim_end_matches('/').to_string(),
        })
    }

    /// True while `SERVER_URL` still holds the bootstrap placeholder.
    pub fn server_url_is_placeholder(&self) -> bool {
        self.server_url == SERVER_URL_PLACEHOLDER
    }
}
