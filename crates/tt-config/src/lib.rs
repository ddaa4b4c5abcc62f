//! # tt-config
//!
//! Layered runtime settings: built-in defaults, then an optional
//! `tides.toml`, then `TIDES__SECTION__KEY` environment variables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection URL, e.g. `sqlite:tides.db?mode=rwc`
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub session_ttl_hours: i64,
    /// Bootstrap admin, created on startup when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentSettings {
    pub slug_max_attempts: u32,
    pub page_size: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub content: ContentSettings,
}

impl Settings {
    /// A builder seeded with every default; callers add sources on top.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:tides.db?mode=rwc")?
            .set_default("auth.session_ttl_hours", 72)?
            .set_default("content.slug_max_attempts", 50)?
            .set_default("content.page_size", 20)?)
    }

    /// Loads `.env`, `tides.toml` (if present) and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        let builder = Self::defaults()?
            .add_source(File::with_name("tides").required(false))
            .add_source(Environment::with_prefix("TIDES").separator("__").try_parsing(true));
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(SettingsError::Invalid {
                name: "auth.session_ttl_hours",
                message: format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            });
        }
        if self.content.slug_max_attempts == 0 {
            return Err(SettingsError::Invalid {
                name: "content.slug_max_attempts",
                message: "must be at least 1".into(),
            });
        }
        if !(1..=100).contains(&self.content.page_size) {
            return Err(SettingsError::Invalid {
                name: "content.page_size",
                message: "must be between 1 and 100".into(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
