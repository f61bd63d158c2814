//! Runtime configuration parsed from environment variables.

use crate::auth::Platform;
use crate::auth::loopback::DEFAULT_LOOPBACK_PORT;
use crate::identity::firebase::DEFAULT_IDENTITY_TOOLKIT_BASE_URL;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    MissingVar { var: &'static str },
    #[error("invalid configuration: {0}")]
    Parse(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub firebase_api_key: String,
    pub google_client_id: String,
    pub google_client_secret: Option<String>,
    /// `None` means detect from the build target.
    pub platform: Option<Platform>,
    pub loopback_port: u16,
    pub open_browser: bool,
    pub identity_toolkit_base_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("firebase_api_key", &"<redacted>")
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &self.google_client_secret.as_ref().map(|_| "<redacted>"))
            .field("platform", &self.platform)
            .field("loopback_port", &self.loopback_port)
            .field("open_browser", &self.open_browser)
            .field("identity_toolkit_base_url", &self.identity_toolkit_base_url)
            .finish()
    }
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `FIREBASE_API_KEY`
    /// - `GOOGLE_WEB_CLIENT_ID`
    ///
    /// Optional:
    /// - `GOOGLE_CLIENT_SECRET`: sent with the code exchange when set
    /// - `SIGNIN_PLATFORM`: `web` or `native`, detected when absent
    /// - `SIGNIN_LOOPBACK_PORT`: default 8085
    /// - `SIGNIN_NO_BROWSER`: print the authorization URL instead of opening it
    /// - `IDENTITY_TOOLKIT_BASE_URL`: default Google endpoint
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar { var })
        };
        let optional = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let firebase_api_key = required("FIREBASE_API_KEY")?;
        let google_client_id = required("GOOGLE_WEB_CLIENT_ID")?;
        let google_client_secret = optional("GOOGLE_CLIENT_SECRET");

        let platform = optional("SIGNIN_PLATFORM").map(|raw| raw.parse::<Platform>()).transpose()?;

        let loopback_port = match optional("SIGNIN_LOOPBACK_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Parse(format!("SIGNIN_LOOPBACK_PORT is not a port: {raw}")))?,
            None => DEFAULT_LOOPBACK_PORT,
        };

        let no_browser = optional("SIGNIN_NO_BROWSER").is_some_and(|raw| parse_bool(&raw));

        let identity_toolkit_base_url = optional("IDENTITY_TOOLKIT_BASE_URL")
            .unwrap_or_else(|| DEFAULT_IDENTITY_TOOLKIT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            firebase_api_key,
            google_client_id,
            google_client_secret,
            platform,
            loopback_port,
            open_browser: !no_browser,
            identity_toolkit_base_url,
        })
    }
}

/// Lenient boolean: `1`, `true`, `yes`, `on` (any case) are true.
#[must_use]
pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
