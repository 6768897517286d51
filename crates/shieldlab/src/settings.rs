//! Server configuration.
//!
//! Defaults match the lab's local setup: backend on port 3001, UI on
//! `http://localhost:3000`, plain-HTTP cookies that live for an hour.
//!
//! [`ServerConfig::load`] layers, lowest priority first:
//! 1. the defaults below
//! 2. an optional `shieldlab.toml` in the working directory
//! 3. `SHIELDLAB__*` environment variables (a `.env` file is read first),
//!    with `__` between nested keys, e.g.
//!    `SHIELDLAB__SESSION__IDLE_TIMEOUT_SECS=600`

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use shieldlab_protocol::SESSION_COOKIE_NAME;
use shieldlab_session::SessionConfig;

use crate::ShieldlabError;

/// Everything needed to start the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,

    /// The one browser origin allowed to make credentialed cross-origin
    /// requests (the lab UI).
    pub allowed_origin: String,

    pub cookie: CookieConfig,

    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            cookie: CookieConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `shieldlab.toml` and the environment.
    ///
    /// # Errors
    /// Returns [`ShieldlabError::Config`] if a source can't be parsed or a
    /// value has the wrong type.
    pub fn load() -> Result<Self, ShieldlabError> {
        dotenvy::dotenv().ok();

        let builder = Config::builder()
            .add_source(File::with_name("shieldlab").required(false))
            .add_source(
                Environment::with_prefix("SHIELDLAB")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<Self, ShieldlabError> {
        Ok(builder.build()?.try_deserialize()?)
    }
}

/// Attributes of the session cookie.
///
/// The cookie is always `HttpOnly` (page scripts can't read it, so an XSS
/// payload can't steal the session) and `SameSite=Lax` (browsers leave it
/// off cross-site POSTs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,

    /// Send the cookie over HTTPS only. Off by default because the lab
    /// runs on plain `http://localhost`; turn it on anywhere else.
    pub secure: bool,

    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            secure: false,
            max_age_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(toml: &str) -> Result<ServerConfig, ShieldlabError> {
        ServerConfig::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3001");
        assert_eq!(config.allowed_origin, "http://localhost:3000");
        assert_eq!(config.cookie.name, "sessionId");
        assert!(!config.cookie.secure);
        assert_eq!(config.cookie.max_age_secs, 3600);
        assert_eq!(config.session.idle_timeout_secs, 3600);
    }

    #[test]
    fn test_from_builder_empty_source_gives_defaults() {
        let config = from_toml("").expect("empty config is valid");
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_from_builder_overrides_nested_fields_only() {
        let config = from_toml(
            r#"
            bind_addr = "0.0.0.0:8080"

            [cookie]
            secure = true

            [session]
            idle_timeout_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.name, "sessionId");
        assert_eq!(config.session.idle_timeout_secs, 0);
        assert_eq!(config.session.sweep_interval_secs, 60);
    }

    #[test]
    fn test_from_builder_wrong_type_is_config_error() {
        let result = from_toml("[session]\nidle_timeout_secs = \"soon\"");
        assert!(matches!(result, Err(ShieldlabError::Config(_))));
    }
}
