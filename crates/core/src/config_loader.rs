use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging defaults, TOML, and
    /// environment variables (`ORDER_RELAY_` prefix, `__` as the section
    /// separator).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a
    /// value fails to deserialize.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Same as [`ConfigLoader::load`] with an explicit TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a
    /// value fails to deserialize.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ORDER_RELAY_").split("__"))
            .extract()?;

        tracing::debug!(source = path, "configuration loaded");
        Ok(config)
    }
}
