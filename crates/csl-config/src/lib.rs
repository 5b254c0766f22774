//! # csl-config
//!
//! Layered configuration loading for Consilium using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CONSILIUM_*` prefix, `__` as separator)
//! 2. Project-level `.consilium/config.toml`
//! 3. User-level `~/.config/consilium/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CONSILIUM_DATABASE__PATH` -> `database.path`,
//! `CONSILIUM_AUTH__TOKEN_SECRET` -> `auth.token_secret`, etc. The `__`
//! (double underscore) separates nested config sections.

mod auth;
mod database;
mod error;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CslConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl CslConfig {
    /// Load configuration from all sources (TOML files + environment
    /// variables).
    ///
    /// Does NOT call `dotenvy` — use [`Self::load_with_dotenv`] if `.env`
    /// file loading is needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when figment extraction fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support. Typical entry point
    /// for the CLI and tests.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when figment extraction fails.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain. Public so tests can inspect the
    /// figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".consilium/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CONSILIUM_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("consilium").join("config.toml"))
    }
}
